//! Teardown - Ordered removal of a configured network
//!
//! Steps run in a fixed order that satisfies the provider's dependency
//! rules. Each step resolves its own targets from the configuration, so an
//! interrupted teardown can simply be re-run. Absent targets are skipped;
//! the first failure ends the run.

use std::fmt;

use crate::builder::{gateway_resource, network_resource, route_table_resource, subnet_resource};
use crate::config::NetworkConfig;
use crate::error::{ProvisionError, ProvisionResult};
use crate::filter::Filters;
use crate::paginate::list;
use crate::provider::Provider;
use crate::provision::{Lookup, delete, exists};
use crate::resource::{Resource, ResourceKind, State, attr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    DeleteRoute,
    DetachGateway,
    DeleteGateway,
    DisassociateSubnets,
    DeleteRouteTable,
    DeleteSubnets,
    DeleteNetwork,
}

impl TeardownStep {
    pub const ORDER: [TeardownStep; 7] = [
        TeardownStep::DeleteRoute,
        TeardownStep::DetachGateway,
        TeardownStep::DeleteGateway,
        TeardownStep::DisassociateSubnets,
        TeardownStep::DeleteRouteTable,
        TeardownStep::DeleteSubnets,
        TeardownStep::DeleteNetwork,
    ];

    pub fn number(&self) -> usize {
        Self::ORDER.iter().position(|s| s == self).unwrap_or(0) + 1
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TeardownStep::DeleteRoute => "delete route",
            TeardownStep::DetachGateway => "detach internet gateway",
            TeardownStep::DeleteGateway => "delete internet gateway",
            TeardownStep::DisassociateSubnets => "disassociate subnets",
            TeardownStep::DeleteRouteTable => "delete route table",
            TeardownStep::DeleteSubnets => "delete subnets",
            TeardownStep::DeleteNetwork => "delete network",
        }
    }
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.describe())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Identifiers of the removed resources
    Done(Vec<String>),
    /// Nothing to remove, with the reason
    Skipped(String),
}

#[derive(Debug, Default)]
pub struct TeardownReport {
    pub steps: Vec<(TeardownStep, StepOutcome)>,
    pub failed: Option<(TeardownStep, ProvisionError)>,
}

impl TeardownReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }

    pub fn outcome(&self, step: TeardownStep) -> Option<&StepOutcome> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, o)| o)
    }
}

async fn lookup<P: Provider + ?Sized>(
    provider: &P,
    resource: &Resource,
) -> ProvisionResult<Option<State>> {
    Ok(exists(provider, resource.kind(), &resource.identity_filters())
        .await?
        .found())
}

async fn find_network<P: Provider + ?Sized>(
    provider: &P,
    config: &NetworkConfig,
) -> ProvisionResult<Option<State>> {
    lookup(provider, &network_resource(config)).await
}

async fn find_route_table<P: Provider + ?Sized>(
    provider: &P,
    config: &NetworkConfig,
) -> ProvisionResult<Option<State>> {
    match find_network(provider, config).await? {
        Some(vpc) => lookup(provider, &route_table_resource(config, &vpc.identifier)).await,
        None => Ok(None),
    }
}

fn skipped(what: impl fmt::Display) -> StepOutcome {
    StepOutcome::Skipped(format!("{} not found", what))
}

async fn delete_all<P: Provider + ?Sized>(
    provider: &P,
    targets: Vec<State>,
) -> ProvisionResult<StepOutcome> {
    let mut removed = Vec::with_capacity(targets.len());
    for target in targets {
        delete(provider, &target).await?;
        removed.push(target.identifier);
    }
    Ok(StepOutcome::Done(removed))
}

async fn run_step<P: Provider + ?Sized>(
    provider: &P,
    config: &NetworkConfig,
    step: TeardownStep,
) -> ProvisionResult<StepOutcome> {
    match step {
        TeardownStep::DeleteRoute => {
            let Some(table) = find_route_table(provider, config).await? else {
                return Ok(skipped(format!("route table '{}'", config.tag_rtb)));
            };
            let filters = Filters::new()
                .attribute(attr::ROUTE_TABLE_ID, &table.identifier)
                .attribute(attr::DESTINATION_CIDR_BLOCK, &config.dest_cidr_block);
            match exists(provider, ResourceKind::Route, &filters).await? {
                Lookup::Found(route) => delete_all(provider, vec![route]).await,
                Lookup::NotFound => Ok(skipped(format!(
                    "route {} in {}",
                    config.dest_cidr_block, table.identifier
                ))),
            }
        }
        TeardownStep::DetachGateway => {
            let Some(gateway) = lookup(provider, &gateway_resource(config)).await? else {
                return Ok(skipped(format!("internet gateway '{}'", config.tag_igw_name)));
            };
            let Some(vpc) = find_network(provider, config).await? else {
                return Ok(skipped(format!("network '{}'", config.tag_vpc_name)));
            };
            let filters = Filters::new()
                .attribute(attr::GATEWAY_ID, &gateway.identifier)
                .attribute(attr::VPC_ID, &vpc.identifier);
            match exists(provider, ResourceKind::GatewayAttachment, &filters).await? {
                Lookup::Found(attachment) => delete_all(provider, vec![attachment]).await,
                Lookup::NotFound => Ok(skipped(format!(
                    "attachment of {} to {}",
                    gateway.identifier, vpc.identifier
                ))),
            }
        }
        TeardownStep::DeleteGateway => match lookup(provider, &gateway_resource(config)).await? {
            Some(gateway) => delete_all(provider, vec![gateway]).await,
            None => Ok(skipped(format!("internet gateway '{}'", config.tag_igw_name))),
        },
        TeardownStep::DisassociateSubnets => {
            let Some(table) = find_route_table(provider, config).await? else {
                return Ok(skipped(format!("route table '{}'", config.tag_rtb)));
            };
            let filters = Filters::new().attribute(attr::ROUTE_TABLE_ID, &table.identifier);
            let associations: Vec<State> =
                list(provider, ResourceKind::RouteTableAssociation, &filters, None)
                    .await?
                    .into_iter()
                    .filter(|a| !a.is_main_association())
                    .collect();
            if associations.is_empty() {
                return Ok(skipped(format!("associations of {}", table.identifier)));
            }
            delete_all(provider, associations).await
        }
        TeardownStep::DeleteRouteTable => match find_route_table(provider, config).await? {
            Some(table) => delete_all(provider, vec![table]).await,
            None => Ok(skipped(format!("route table '{}'", config.tag_rtb))),
        },
        TeardownStep::DeleteSubnets => {
            let Some(vpc) = find_network(provider, config).await? else {
                return Ok(skipped(format!("network '{}'", config.tag_vpc_name)));
            };
            let mut subnets = Vec::new();
            for layout in config.subnets() {
                if let Some(subnet) =
                    lookup(provider, &subnet_resource(config, &vpc.identifier, &layout)).await?
                {
                    subnets.push(subnet);
                }
            }
            if subnets.is_empty() {
                return Ok(skipped(format!("subnets of {}", vpc.identifier)));
            }
            delete_all(provider, subnets).await
        }
        TeardownStep::DeleteNetwork => match find_network(provider, config).await? {
            Some(vpc) => delete_all(provider, vec![vpc]).await,
            None => Ok(skipped(format!("network '{}'", config.tag_vpc_name))),
        },
    }
}

/// Remove the network described by `config`, dependents first
pub async fn teardown<P: Provider + ?Sized>(provider: &P, config: &NetworkConfig) -> TeardownReport {
    let mut report = TeardownReport::default();

    for step in TeardownStep::ORDER {
        match run_step(provider, config, step).await {
            Ok(outcome) => {
                if let StepOutcome::Skipped(reason) = &outcome {
                    log::info!("Step {} skipped: {}", step, reason);
                }
                report.steps.push((step, outcome));
            }
            Err(e) => {
                log::error!("Step {} failed: {}", step, e);
                report.failed = Some((step, e));
                break;
            }
        }
    }

    report
}
