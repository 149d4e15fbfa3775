//! vpcwright AWS Provider
//!
//! `Provider` implementation over the EC2 API

mod compute;
pub mod error;
pub mod filters;
mod security_group;
mod vpc;

use aws_config::Region;
use aws_sdk_ec2::Client as Ec2Client;
use vpcwright_core::filter::Filters;
use vpcwright_core::paginate::Page;
use vpcwright_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult};
use vpcwright_core::resource::{Resource, ResourceKind, ResourceSpec, State};

/// AWS Provider
pub struct AwsProvider {
    ec2_client: Ec2Client,
    region: String,
}

impl AwsProvider {
    /// Create a new AWS Provider
    ///
    /// Credentials come from the SDK's default chain. Without an explicit
    /// region the chain's region (environment, profile) is used.
    pub async fn new(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;
        let region = config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_default();

        log::debug!("Using EC2 in region '{}'", region);
        Self {
            ec2_client: Ec2Client::new(&config),
            region,
        }
    }

    /// Create with a specific client (for testing)
    pub fn with_client(ec2_client: Ec2Client, region: String) -> Self {
        Self { ec2_client, region }
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

fn page_of(items: Vec<State>, next_token: Option<&str>) -> Page<State> {
    match next_token {
        Some(token) if !token.is_empty() => Page::with_next(items, token),
        _ => Page::last(items),
    }
}

/// Attribute a delete needs from the described state
fn required_attribute<'a>(target: &'a State, key: &str) -> ProviderResult<&'a str> {
    target.attribute(key).ok_or_else(|| {
        ProviderError::invalid_input(format!(
            "{} {} has no '{}' attribute",
            target.kind, target.identifier, key
        ))
        .for_resource(target.kind)
    })
}

impl Provider for AwsProvider {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn supported_kinds(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL.to_vec()
    }

    fn describe(
        &self,
        kind: ResourceKind,
        filters: &Filters,
        next_token: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<Page<State>>> {
        let filters = filters.clone();
        let next_token = next_token.map(String::from);
        Box::pin(async move {
            match kind {
                ResourceKind::Network => self.describe_vpcs(&filters, next_token).await,
                ResourceKind::Subnet => self.describe_subnets(&filters, next_token).await,
                ResourceKind::RouteTable
                | ResourceKind::RouteTableAssociation
                | ResourceKind::Route => {
                    self.describe_route_tables(kind, &filters, next_token).await
                }
                ResourceKind::InternetGateway | ResourceKind::GatewayAttachment => {
                    self.describe_internet_gateways(kind, &filters, next_token)
                        .await
                }
                ResourceKind::SecurityGroup => {
                    self.describe_security_groups(&filters, next_token).await
                }
                ResourceKind::SecurityGroupRule => {
                    self.describe_security_group_rules(&filters, next_token)
                        .await
                }
                ResourceKind::KeyPair => self.describe_key_pairs(&filters).await,
                ResourceKind::Instance => self.describe_instances(&filters, next_token).await,
                ResourceKind::Image => self.describe_images(&filters, next_token).await,
                ResourceKind::InstanceType => {
                    self.describe_instance_types(next_token).await
                }
            }
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            let tags = &resource.tags;
            match &resource.spec {
                ResourceSpec::Network {
                    cidr_block,
                    enable_dns,
                } => self.create_vpc(cidr_block, *enable_dns, tags).await,
                ResourceSpec::Subnet {
                    vpc_id,
                    cidr_block,
                    availability_zone,
                } => {
                    self.create_subnet(vpc_id, cidr_block, availability_zone.as_deref(), tags)
                        .await
                }
                ResourceSpec::RouteTable { vpc_id } => self.create_route_table(vpc_id, tags).await,
                ResourceSpec::RouteTableAssociation {
                    route_table_id,
                    subnet_id,
                } => self.associate_route_table(route_table_id, subnet_id).await,
                ResourceSpec::InternetGateway => self.create_internet_gateway(tags).await,
                ResourceSpec::GatewayAttachment { gateway_id, vpc_id } => {
                    self.attach_internet_gateway(gateway_id, vpc_id).await
                }
                ResourceSpec::Route {
                    route_table_id,
                    destination_cidr_block,
                    gateway_id,
                } => {
                    self.create_route(route_table_id, destination_cidr_block, gateway_id)
                        .await
                }
                ResourceSpec::SecurityGroup {
                    vpc_id,
                    group_name,
                    description,
                } => {
                    self.create_security_group(vpc_id, group_name, description, tags)
                        .await
                }
                ResourceSpec::SecurityGroupRule { group_id, rule } => {
                    self.authorize_rule(group_id, rule).await
                }
                ResourceSpec::KeyPair { key_name } => self.create_key_pair(key_name).await,
                ResourceSpec::Instance(spec) => self.run_instance(spec, tags).await,
            }
        })
    }

    fn delete(&self, target: &State) -> BoxFuture<'_, ProviderResult<()>> {
        let target = target.clone();
        Box::pin(async move {
            match target.kind {
                ResourceKind::Network => self.delete_vpc(&target.identifier).await,
                ResourceKind::Subnet => self.delete_subnet(&target.identifier).await,
                ResourceKind::RouteTable => self.delete_route_table(&target.identifier).await,
                ResourceKind::RouteTableAssociation => {
                    self.disassociate_route_table(&target.identifier).await
                }
                ResourceKind::InternetGateway => {
                    self.delete_internet_gateway(&target.identifier).await
                }
                ResourceKind::GatewayAttachment => self.detach_internet_gateway(&target).await,
                ResourceKind::Route => self.delete_route(&target).await,
                ResourceKind::SecurityGroup => {
                    self.delete_security_group(&target.identifier).await
                }
                ResourceKind::SecurityGroupRule => self.revoke_rule(&target).await,
                ResourceKind::KeyPair => self.delete_key_pair(&target.identifier).await,
                ResourceKind::Instance => self.terminate_instance(&target.identifier).await,
                ResourceKind::Image | ResourceKind::InstanceType => Err(
                    ProviderError::invalid_input(format!("{} cannot be deleted", target.kind))
                        .for_resource(target.kind),
                ),
            }
        })
    }
}
