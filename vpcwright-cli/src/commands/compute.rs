//! Key pair, instance, image and instance type commands

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Subcommand;

use vpcwright_core::filter::Filters;
use vpcwright_core::provider::Provider;
use vpcwright_core::provision::find_by_id;
use vpcwright_core::resource::{InstanceSpec, Resource, ResourceKind, ResourceSpec, State, attr};
use vpcwright_core::tags::Tags;

use super::{
    create_and_print, delete_by_id, delete_matching, ensure_and_print, heading, list_and_print,
    optional_filters,
};
use crate::output;

#[derive(Subcommand)]
pub enum KeyPairCommands {
    /// Create a key pair unless the name is taken, printing the private key once
    Create {
        #[arg(long)]
        name: String,
    },
    /// Delete a key pair by name or by key pair ID
    Delete {
        #[arg(long, required_unless_present = "id", conflicts_with = "id")]
        name: Option<String>,
        #[arg(long)]
        id: Option<String>,
    },
    /// List key pairs
    List {
        /// Case-insensitive glob on the key name
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum InstanceCommands {
    /// Launch instances with a public address (never existence-checked)
    Create {
        #[arg(long)]
        image_id: String,
        #[arg(long)]
        instance_type: String,
        #[arg(long)]
        key_name: String,
        #[arg(long)]
        subnet_id: String,
        /// Security group to place the instances in (repeatable)
        #[arg(long = "security-group-id", value_name = "GROUP_ID")]
        security_group_ids: Vec<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        env: String,
        /// Number of instances to launch
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,
        /// Script passed to the instances as user data
        #[arg(long)]
        user_data: Option<PathBuf>,
        /// Return right after launch instead of waiting for `running`
        #[arg(long)]
        no_wait: bool,
        /// Seconds to wait for the instances to be running
        #[arg(long, default_value_t = 600, conflicts_with = "no_wait")]
        wait_timeout: u64,
    },
    /// Terminate an instance
    Delete {
        #[arg(long)]
        id: String,
    },
    /// List instances with state, type and addresses
    List {
        #[arg(long)]
        vpc_id: Option<String>,
        #[arg(long)]
        subnet_id: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ImageCommands {
    /// List images owned by this account
    List {
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum InstanceTypeCommands {
    /// List available instance types
    List {
        /// Case-insensitive glob on the type name, e.g. `t3.*`
        #[arg(long)]
        name: Option<String>,
    },
}

pub async fn run_key_pair(provider: &dyn Provider, command: KeyPairCommands) -> Result<(), String> {
    match command {
        KeyPairCommands::Create { name } => {
            let key = Resource::new(ResourceSpec::KeyPair { key_name: name });
            let state = ensure_and_print(provider, &key).await?;
            output::print_key_material(&state);
            Ok(())
        }
        KeyPairCommands::Delete { name, id } => match (name, id) {
            (_, Some(id)) => delete_by_id(provider, ResourceKind::KeyPair, &id).await,
            (Some(name), None) => {
                let filters = Filters::new().attribute(attr::KEY_NAME, name);
                delete_matching(provider, ResourceKind::KeyPair, &filters).await
            }
            (None, None) => Err("pass --name or --id".to_string()),
        },
        KeyPairCommands::List { name } => {
            list_and_print(provider, ResourceKind::KeyPair, &Filters::new(), name.as_deref()).await
        }
    }
}

pub async fn run_instance(provider: &dyn Provider, command: InstanceCommands) -> Result<(), String> {
    match command {
        InstanceCommands::Create {
            image_id,
            instance_type,
            key_name,
            subnet_id,
            security_group_ids,
            name,
            env,
            count,
            user_data,
            no_wait,
            wait_timeout,
        } => {
            let user_data = user_data
                .map(|path| {
                    fs::read_to_string(&path)
                        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
                })
                .transpose()?;
            let instance = Resource::new(ResourceSpec::Instance(InstanceSpec {
                image_id,
                instance_type,
                key_name,
                subnet_id,
                security_group_ids,
                user_data,
            }))
            .with_tags(Tags::named(name, env));

            heading(&format!("Launching {} instance(s)...", count));
            let mut launched = Vec::with_capacity(count as usize);
            for _ in 0..count {
                launched.push(create_and_print(provider, &instance).await?.identifier);
            }
            if no_wait {
                return Ok(());
            }

            println!();
            heading("Waiting for instances to be running...");
            let running = wait_for_running(
                provider,
                &launched,
                Duration::from_secs(wait_timeout),
                POLL_INTERVAL,
            )
            .await?;
            output::print_running(&running);
            Ok(())
        }
        InstanceCommands::Delete { id } => delete_by_id(provider, ResourceKind::Instance, &id).await,
        InstanceCommands::List {
            vpc_id,
            subnet_id,
            name,
        } => {
            let filters = optional_filters([
                (attr::VPC_ID, vpc_id.as_ref()),
                (attr::SUBNET_ID, subnet_id.as_ref()),
            ]);
            list_and_print(provider, ResourceKind::Instance, &filters, name.as_deref()).await
        }
    }
}

const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Poll each instance until it reports `running`, giving up after `timeout`
async fn wait_for_running(
    provider: &dyn Provider,
    instance_ids: &[String],
    timeout: Duration,
    interval: Duration,
) -> Result<Vec<State>, String> {
    tokio::time::timeout(timeout, poll_until_running(provider, instance_ids, interval))
        .await
        .map_err(|_| {
            format!(
                "Timed out waiting for {} to be running after {}s",
                instance_ids.join(", "),
                timeout.as_secs()
            )
        })?
}

async fn poll_until_running(
    provider: &dyn Provider,
    instance_ids: &[String],
    interval: Duration,
) -> Result<Vec<State>, String> {
    let mut running = Vec::with_capacity(instance_ids.len());
    for instance_id in instance_ids {
        loop {
            // A fresh launch can be briefly invisible to describe calls
            let state = match find_by_id(provider, ResourceKind::Instance, instance_id).await {
                Ok(state) => state,
                Err(e) if e.is_not_found() => {
                    tokio::time::sleep(interval).await;
                    continue;
                }
                Err(e) => return Err(e.to_string()),
            };
            match state.attribute(attr::STATE) {
                Some("running") => {}
                None | Some("pending") => {
                    log::debug!("Instance {} still pending", instance_id);
                    tokio::time::sleep(interval).await;
                    continue;
                }
                Some(other) => {
                    return Err(format!(
                        "Instance {} entered unexpected state: {}",
                        instance_id, other
                    ));
                }
            }
            log::info!("Instance {} is running", instance_id);
            running.push(state);
            break;
        }
    }
    Ok(running)
}

pub async fn run_image(provider: &dyn Provider, command: ImageCommands) -> Result<(), String> {
    match command {
        ImageCommands::List { name } => {
            list_and_print(provider, ResourceKind::Image, &Filters::new(), name.as_deref()).await
        }
    }
}

pub async fn run_instance_type(
    provider: &dyn Provider,
    command: InstanceTypeCommands,
) -> Result<(), String> {
    match command {
        InstanceTypeCommands::List { name } => {
            list_and_print(
                provider,
                ResourceKind::InstanceType,
                &Filters::new(),
                name.as_deref(),
            )
            .await
        }
    }
}
