//! Builder - Seven-step public network bring-up
//!
//! Every step is an `ensure`, so re-running against a partially built
//! network only creates what is missing. The first failure stops the run;
//! nothing already created is rolled back.

use std::fmt;

use crate::config::{NetworkConfig, SubnetLayout};
use crate::error::{ProvisionError, ProvisionResult};
use crate::provider::Provider;
use crate::provision::{Provisioned, ensure};
use crate::resource::{Resource, ResourceSpec};
use crate::tags::Tags;

/// Steps of `network up`, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Network,
    Subnets,
    RouteTable,
    Associations,
    InternetGateway,
    Attachment,
    Route,
}

impl BuildStep {
    pub const ORDER: [BuildStep; 7] = [
        BuildStep::Network,
        BuildStep::Subnets,
        BuildStep::RouteTable,
        BuildStep::Associations,
        BuildStep::InternetGateway,
        BuildStep::Attachment,
        BuildStep::Route,
    ];

    /// 1-based position in `ORDER`
    pub fn number(&self) -> usize {
        Self::ORDER.iter().position(|s| s == self).unwrap_or(0) + 1
    }

    pub fn describe(&self) -> &'static str {
        match self {
            BuildStep::Network => "create network",
            BuildStep::Subnets => "create public subnets",
            BuildStep::RouteTable => "create route table",
            BuildStep::Associations => "associate subnets with route table",
            BuildStep::InternetGateway => "create internet gateway",
            BuildStep::Attachment => "attach internet gateway",
            BuildStep::Route => "create default route",
        }
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.describe())
    }
}

/// Resources a completed step created or found
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub step: BuildStep,
    pub resources: Vec<Provisioned>,
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub completed: Vec<BuildOutcome>,
    pub failed: Option<(BuildStep, ProvisionError)>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }

    pub fn created(&self) -> usize {
        self.completed
            .iter()
            .flat_map(|o| &o.resources)
            .filter(|p| p.was_created())
            .count()
    }
}

pub(crate) fn network_resource(config: &NetworkConfig) -> Resource {
    Resource::new(ResourceSpec::Network {
        cidr_block: config.cidr_block.clone(),
        enable_dns: config.enable_dns,
    })
    .with_tags(Tags::named(&config.tag_vpc_name, &config.tag_env))
}

pub(crate) fn subnet_resource(config: &NetworkConfig, vpc_id: &str, subnet: &SubnetLayout<'_>) -> Resource {
    Resource::new(ResourceSpec::Subnet {
        vpc_id: vpc_id.to_string(),
        cidr_block: subnet.cidr_block.to_string(),
        availability_zone: Some(subnet.availability_zone.to_string()),
    })
    .with_tags(Tags::named(subnet.name, &config.tag_env))
}

pub(crate) fn route_table_resource(config: &NetworkConfig, vpc_id: &str) -> Resource {
    Resource::new(ResourceSpec::RouteTable {
        vpc_id: vpc_id.to_string(),
    })
    .with_tags(Tags::named(&config.tag_rtb, &config.tag_env))
}

pub(crate) fn gateway_resource(config: &NetworkConfig) -> Resource {
    Resource::new(ResourceSpec::InternetGateway)
        .with_tags(Tags::named(&config.tag_igw_name, &config.tag_env))
}

/// Identifiers produced by earlier steps
#[derive(Default)]
struct Built {
    vpc_id: String,
    subnet_ids: Vec<String>,
    route_table_id: String,
    gateway_id: String,
}

async fn run_step<P: Provider + ?Sized>(
    provider: &P,
    config: &NetworkConfig,
    step: BuildStep,
    built: &mut Built,
) -> ProvisionResult<Vec<Provisioned>> {
    match step {
        BuildStep::Network => {
            let network = ensure(provider, &network_resource(config)).await?;
            built.vpc_id = network.identifier().to_string();
            Ok(vec![network])
        }
        BuildStep::Subnets => {
            let mut out = Vec::new();
            for subnet in config.subnets() {
                let provisioned =
                    ensure(provider, &subnet_resource(config, &built.vpc_id, &subnet)).await?;
                built.subnet_ids.push(provisioned.identifier().to_string());
                out.push(provisioned);
            }
            Ok(out)
        }
        BuildStep::RouteTable => {
            let table = ensure(provider, &route_table_resource(config, &built.vpc_id)).await?;
            built.route_table_id = table.identifier().to_string();
            Ok(vec![table])
        }
        BuildStep::Associations => {
            let mut out = Vec::new();
            for subnet_id in &built.subnet_ids {
                let association = Resource::new(ResourceSpec::RouteTableAssociation {
                    route_table_id: built.route_table_id.clone(),
                    subnet_id: subnet_id.clone(),
                });
                out.push(ensure(provider, &association).await?);
            }
            Ok(out)
        }
        BuildStep::InternetGateway => {
            let gateway = ensure(provider, &gateway_resource(config)).await?;
            built.gateway_id = gateway.identifier().to_string();
            Ok(vec![gateway])
        }
        BuildStep::Attachment => {
            let attachment = Resource::new(ResourceSpec::GatewayAttachment {
                gateway_id: built.gateway_id.clone(),
                vpc_id: built.vpc_id.clone(),
            });
            Ok(vec![ensure(provider, &attachment).await?])
        }
        BuildStep::Route => {
            let route = Resource::new(ResourceSpec::Route {
                route_table_id: built.route_table_id.clone(),
                destination_cidr_block: config.dest_cidr_block.clone(),
                gateway_id: built.gateway_id.clone(),
            });
            Ok(vec![ensure(provider, &route).await?])
        }
    }
}

/// Bring up the network described by `config`
pub async fn build_network<P: Provider + ?Sized>(provider: &P, config: &NetworkConfig) -> BuildReport {
    let mut report = BuildReport::default();
    let mut built = Built::default();

    for step in BuildStep::ORDER {
        log::debug!("Step {}", step);
        match run_step(provider, config, step, &mut built).await {
            Ok(resources) => report.completed.push(BuildOutcome { step, resources }),
            Err(e) => {
                log::error!("Step {} failed: {}", step, e);
                report.failed = Some((step, e));
                break;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filters;
    use crate::memory::MemoryProvider;
    use crate::paginate::describe_all;
    use crate::provision::create;
    use crate::resource::{ResourceKind, attr};

    fn sample_config() -> NetworkConfig {
        NetworkConfig::from_json(
            r#"{
                "CIDR_BLOCK": "10.0.0.0/16",
                "TAG_VPC_NAME": "AcmeLabs-Dev",
                "TAG_ENV": "Dev",
                "CIDR_PUBLIC_SUBNETS": ["10.0.1.0/24", "10.0.2.0/24"],
                "AVAILABILITY_ZONES": ["us-east-1a", "us-east-1b"],
                "TAG_SUBNETS": ["Public-Subnet-1", "Public-Subnet-2"],
                "TAG_RTB": "Public-RTB",
                "TAG_IGW_NAME": "AcmeLabs-IGW"
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn builds_every_step_then_is_idempotent() {
        let provider = MemoryProvider::new();
        let config = sample_config();

        let first = build_network(&provider, &config).await;
        assert!(first.is_success());
        assert_eq!(first.completed.len(), 7);
        // network, 2 subnets, table, 2 associations, gateway, attachment, route
        assert_eq!(first.created(), 9);

        let requests = provider.create_requests();
        let second = build_network(&provider, &config).await;
        assert!(second.is_success());
        assert_eq!(second.created(), 0);
        assert_eq!(provider.create_requests(), requests);

        let routes = describe_all(&provider, ResourceKind::Route, &Filters::new())
            .await
            .unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].attribute(attr::DESTINATION_CIDR_BLOCK), Some("0.0.0.0/0"));
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let provider = MemoryProvider::new();
        let config = sample_config();

        // The configured gateway already serves another network
        let elsewhere = create(
            &provider,
            &Resource::new(ResourceSpec::Network {
                cidr_block: "172.16.0.0/16".to_string(),
                enable_dns: false,
            })
            .with_tags(Tags::named("Other", "Dev")),
        )
        .await
        .unwrap();
        let gateway = create(&provider, &gateway_resource(&config)).await.unwrap();
        create(
            &provider,
            &Resource::new(ResourceSpec::GatewayAttachment {
                gateway_id: gateway.identifier,
                vpc_id: elsewhere.identifier,
            }),
        )
        .await
        .unwrap();

        let report = build_network(&provider, &config).await;
        assert!(!report.is_success());
        let completed: Vec<BuildStep> = report.completed.iter().map(|o| o.step).collect();
        assert_eq!(completed, BuildStep::ORDER[..5].to_vec());
        assert!(matches!(
            report.failed,
            Some((BuildStep::Attachment, ProvisionError::CreateRejected(_)))
        ));

        let routes = describe_all(&provider, ResourceKind::Route, &Filters::new())
            .await
            .unwrap();
        assert!(routes.is_empty());
    }

    #[tokio::test]
    async fn partial_network_is_completed() {
        let provider = MemoryProvider::new();
        let config = sample_config();
        let vpc = create(&provider, &network_resource(&config)).await.unwrap();

        let report = build_network(&provider, &config).await;
        assert!(report.is_success());
        assert!(!report.completed[0].resources[0].was_created());
        assert_eq!(report.completed[0].resources[0].identifier(), vpc.identifier);
        assert_eq!(report.created(), 8);
    }

    #[test]
    fn step_numbering() {
        assert_eq!(BuildStep::Network.number(), 1);
        assert_eq!(BuildStep::Route.number(), 7);
        assert_eq!(BuildStep::Attachment.to_string(), "6. attach internet gateway");
    }
}
