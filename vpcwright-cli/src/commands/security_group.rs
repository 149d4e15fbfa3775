//! Security group and rule commands

use clap::{Args, Subcommand};

use vpcwright_core::filter::Filters;
use vpcwright_core::provider::Provider;
use vpcwright_core::provision::resolve;
use vpcwright_core::resource::{Direction, Resource, ResourceKind, ResourceSpec, RuleSpec, attr};
use vpcwright_core::tags::Tags;

use super::{delete_by_id, delete_matching, ensure_and_print, list_and_print, optional_filters};

/// Rules given as `protocol:ports:source`, e.g. `tcp:22:0.0.0.0/0`, `tcp:8000-8080:sg-123`, `all:*:10.0.0.0/8`
#[derive(Args, Default)]
pub struct RuleArgs {
    /// Ingress rule (repeatable)
    #[arg(long = "ingress", value_name = "RULE")]
    pub ingress: Vec<String>,
    /// Egress rule (repeatable)
    #[arg(long = "egress", value_name = "RULE")]
    pub egress: Vec<String>,
}

impl RuleArgs {
    /// Parse every rule before anything is sent
    fn parse(&self) -> Result<Vec<RuleSpec>, String> {
        let ingress = self
            .ingress
            .iter()
            .map(|r| RuleSpec::parse(Direction::Ingress, r));
        let egress = self
            .egress
            .iter()
            .map(|r| RuleSpec::parse(Direction::Egress, r));
        ingress
            .chain(egress)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())
    }
}

#[derive(Subcommand)]
pub enum SecurityGroupCommands {
    /// Create a security group (unless the name exists in the network) and ensure its rules
    Create {
        #[arg(long)]
        vpc_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        env: String,
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Delete a security group by ID, or by name within a network
    Delete {
        #[arg(long, conflicts_with_all = ["vpc_id", "name"])]
        id: Option<String>,
        #[arg(long, requires = "name")]
        vpc_id: Option<String>,
        #[arg(long, requires = "vpc_id")]
        name: Option<String>,
    },
    /// Add rules to an existing group
    Authorize {
        #[arg(long)]
        group_id: String,
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Remove rules from a group
    Revoke {
        #[arg(long)]
        group_id: String,
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// List security groups
    List {
        #[arg(long)]
        vpc_id: Option<String>,
        /// Case-insensitive glob on the group name
        #[arg(long)]
        name: Option<String>,
    },
    /// List the rules of a group
    Rules {
        #[arg(long)]
        group_id: String,
    },
}

fn rule_resource(group_id: &str, rule: RuleSpec) -> Resource {
    Resource::new(ResourceSpec::SecurityGroupRule {
        group_id: group_id.to_string(),
        rule,
    })
}

async fn authorize(provider: &dyn Provider, group_id: &str, rules: &RuleArgs) -> Result<(), String> {
    for rule in rules.parse()? {
        ensure_and_print(provider, &rule_resource(group_id, rule)).await?;
    }
    Ok(())
}

pub async fn run(provider: &dyn Provider, command: SecurityGroupCommands) -> Result<(), String> {
    match command {
        SecurityGroupCommands::Create {
            vpc_id,
            name,
            description,
            env,
            rules,
        } => {
            rules.parse()?;
            resolve(
                provider,
                ResourceKind::Network,
                &Filters::new().attribute(attr::ID, &vpc_id),
            )
            .await
            .map_err(|e| e.to_string())?;

            let description = description.unwrap_or_else(|| format!("{} security group", name));
            let group = Resource::new(ResourceSpec::SecurityGroup {
                vpc_id,
                group_name: name.clone(),
                description,
            })
            .with_tags(Tags::named(name, env));
            let group = ensure_and_print(provider, &group).await?;
            authorize(provider, &group.identifier, &rules).await
        }
        SecurityGroupCommands::Delete { id, vpc_id, name } => match (id, vpc_id, name) {
            (Some(id), _, _) => delete_by_id(provider, ResourceKind::SecurityGroup, &id).await,
            (None, Some(vpc_id), Some(name)) => {
                let filters = Filters::new()
                    .attribute(attr::VPC_ID, vpc_id)
                    .attribute(attr::GROUP_NAME, name);
                delete_matching(provider, ResourceKind::SecurityGroup, &filters).await
            }
            _ => Err("pass --id, or --vpc-id and --name".to_string()),
        },
        SecurityGroupCommands::Authorize { group_id, rules } => {
            resolve(
                provider,
                ResourceKind::SecurityGroup,
                &Filters::new().attribute(attr::ID, &group_id),
            )
            .await
            .map_err(|e| e.to_string())?;
            authorize(provider, &group_id, &rules).await
        }
        SecurityGroupCommands::Revoke { group_id, rules } => {
            for rule in rules.parse()? {
                let filters = rule_resource(&group_id, rule).identity_filters();
                delete_matching(provider, ResourceKind::SecurityGroupRule, &filters).await?;
            }
            Ok(())
        }
        SecurityGroupCommands::List { vpc_id, name } => {
            let filters = optional_filters([(attr::VPC_ID, vpc_id.as_ref())]);
            list_and_print(provider, ResourceKind::SecurityGroup, &filters, name.as_deref()).await
        }
        SecurityGroupCommands::Rules { group_id } => {
            let filters = Filters::new().attribute(attr::GROUP_ID, group_id);
            list_and_print(provider, ResourceKind::SecurityGroupRule, &filters, None).await
        }
    }
}
