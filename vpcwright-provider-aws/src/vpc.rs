//! VPC, subnet, route table and internet gateway operations

use aws_sdk_ec2::types::{
    AttributeBooleanValue, InternetGateway, ResourceType, RouteTable, Subnet, Vpc,
};
use vpcwright_core::filter::Filters;
use vpcwright_core::paginate::Page;
use vpcwright_core::provider::ProviderResult;
use vpcwright_core::resource::{
    ResourceKind, State, attachment_identifier, attr, route_identifier,
};
use vpcwright_core::tags::Tags;

use crate::error::{missing_field, sdk_error};
use crate::filters::{from_ec2_tags, request_filters, tag_specification};
use crate::{AwsProvider, page_of, required_attribute};

impl AwsProvider {
    // ========== EC2 VPC Operations ==========

    pub(crate) async fn describe_vpcs(
        &self,
        filters: &Filters,
        next_token: Option<String>,
    ) -> ProviderResult<Page<State>> {
        let result = self
            .ec2_client
            .describe_vpcs()
            .set_filters(request_filters(ResourceKind::Network, filters))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("describe VPCs", ResourceKind::Network, e))?;

        let items = result.vpcs().iter().filter_map(vpc_state).collect();
        Ok(page_of(items, result.next_token()))
    }

    pub(crate) async fn create_vpc(
        &self,
        cidr_block: &str,
        enable_dns: bool,
        tags: &Tags,
    ) -> ProviderResult<State> {
        let result = self
            .ec2_client
            .create_vpc()
            .cidr_block(cidr_block)
            .tag_specifications(tag_specification(ResourceType::Vpc, tags))
            .send()
            .await
            .map_err(|e| sdk_error("create VPC", ResourceKind::Network, e))?;

        let mut state = result
            .vpc()
            .and_then(vpc_state)
            .ok_or_else(|| missing_field(ResourceKind::Network, "VPC ID"))?
            .with_tags(tags.clone());

        if enable_dns {
            self.enable_vpc_dns(&state.identifier).await?;
            state = state.with_attribute(attr::ENABLE_DNS, "true");
        }

        log::info!("Created VPC {} ({})", state.identifier, cidr_block);
        Ok(state)
    }

    /// Turn on DNS support and DNS hostnames; EC2 takes one attribute per call
    async fn enable_vpc_dns(&self, vpc_id: &str) -> ProviderResult<()> {
        let enabled = || AttributeBooleanValue::builder().value(true).build();

        self.ec2_client
            .modify_vpc_attribute()
            .vpc_id(vpc_id)
            .enable_dns_support(enabled())
            .send()
            .await
            .map_err(|e| sdk_error("enable DNS support", ResourceKind::Network, e))?;

        self.ec2_client
            .modify_vpc_attribute()
            .vpc_id(vpc_id)
            .enable_dns_hostnames(enabled())
            .send()
            .await
            .map_err(|e| sdk_error("enable DNS hostnames", ResourceKind::Network, e))?;

        Ok(())
    }

    pub(crate) async fn delete_vpc(&self, vpc_id: &str) -> ProviderResult<()> {
        self.ec2_client
            .delete_vpc()
            .vpc_id(vpc_id)
            .send()
            .await
            .map_err(|e| sdk_error("delete VPC", ResourceKind::Network, e))?;
        log::info!("Deleted VPC {}", vpc_id);
        Ok(())
    }

    // ========== EC2 Subnet Operations ==========

    pub(crate) async fn describe_subnets(
        &self,
        filters: &Filters,
        next_token: Option<String>,
    ) -> ProviderResult<Page<State>> {
        let result = self
            .ec2_client
            .describe_subnets()
            .set_filters(request_filters(ResourceKind::Subnet, filters))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("describe subnets", ResourceKind::Subnet, e))?;

        let items = result.subnets().iter().filter_map(subnet_state).collect();
        Ok(page_of(items, result.next_token()))
    }

    pub(crate) async fn create_subnet(
        &self,
        vpc_id: &str,
        cidr_block: &str,
        availability_zone: Option<&str>,
        tags: &Tags,
    ) -> ProviderResult<State> {
        let result = self
            .ec2_client
            .create_subnet()
            .vpc_id(vpc_id)
            .cidr_block(cidr_block)
            .set_availability_zone(availability_zone.map(String::from))
            .tag_specifications(tag_specification(ResourceType::Subnet, tags))
            .send()
            .await
            .map_err(|e| sdk_error("create subnet", ResourceKind::Subnet, e))?;

        let state = result
            .subnet()
            .and_then(subnet_state)
            .ok_or_else(|| missing_field(ResourceKind::Subnet, "subnet ID"))?
            .with_tags(tags.clone());

        log::info!("Created subnet {} ({}) in {}", state.identifier, cidr_block, vpc_id);
        Ok(state)
    }

    pub(crate) async fn delete_subnet(&self, subnet_id: &str) -> ProviderResult<()> {
        self.ec2_client
            .delete_subnet()
            .subnet_id(subnet_id)
            .send()
            .await
            .map_err(|e| sdk_error("delete subnet", ResourceKind::Subnet, e))?;
        log::info!("Deleted subnet {}", subnet_id);
        Ok(())
    }

    // ========== EC2 Route Table Operations ==========

    /// Route tables, their associations and their routes all come from
    /// DescribeRouteTables; `kind` selects which of them a page holds.
    pub(crate) async fn describe_route_tables(
        &self,
        kind: ResourceKind,
        filters: &Filters,
        next_token: Option<String>,
    ) -> ProviderResult<Page<State>> {
        let result = self
            .ec2_client
            .describe_route_tables()
            .set_filters(request_filters(kind, filters))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("describe route tables", kind, e))?;

        let tables = result.route_tables();
        let items = match kind {
            ResourceKind::RouteTableAssociation => {
                tables.iter().flat_map(association_states).collect()
            }
            ResourceKind::Route => tables.iter().flat_map(route_states).collect(),
            _ => tables.iter().filter_map(route_table_state).collect(),
        };
        Ok(page_of(items, result.next_token()))
    }

    pub(crate) async fn create_route_table(
        &self,
        vpc_id: &str,
        tags: &Tags,
    ) -> ProviderResult<State> {
        let result = self
            .ec2_client
            .create_route_table()
            .vpc_id(vpc_id)
            .tag_specifications(tag_specification(ResourceType::RouteTable, tags))
            .send()
            .await
            .map_err(|e| sdk_error("create route table", ResourceKind::RouteTable, e))?;

        let state = result
            .route_table()
            .and_then(route_table_state)
            .ok_or_else(|| missing_field(ResourceKind::RouteTable, "route table ID"))?
            .with_tags(tags.clone());

        log::info!("Created route table {} in {}", state.identifier, vpc_id);
        Ok(state)
    }

    pub(crate) async fn delete_route_table(&self, route_table_id: &str) -> ProviderResult<()> {
        self.ec2_client
            .delete_route_table()
            .route_table_id(route_table_id)
            .send()
            .await
            .map_err(|e| sdk_error("delete route table", ResourceKind::RouteTable, e))?;
        log::info!("Deleted route table {}", route_table_id);
        Ok(())
    }

    pub(crate) async fn associate_route_table(
        &self,
        route_table_id: &str,
        subnet_id: &str,
    ) -> ProviderResult<State> {
        let kind = ResourceKind::RouteTableAssociation;
        let result = self
            .ec2_client
            .associate_route_table()
            .route_table_id(route_table_id)
            .subnet_id(subnet_id)
            .send()
            .await
            .map_err(|e| sdk_error("associate route table", kind, e))?;

        let association_id = result
            .association_id()
            .ok_or_else(|| missing_field(kind, "association ID"))?;

        log::info!(
            "Associated route table {} with subnet {} ({})",
            route_table_id,
            subnet_id,
            association_id
        );
        Ok(State::new(kind, association_id)
            .with_attribute(attr::ROUTE_TABLE_ID, route_table_id)
            .with_attribute(attr::SUBNET_ID, subnet_id)
            .with_attribute(attr::MAIN, "false"))
    }

    pub(crate) async fn disassociate_route_table(&self, association_id: &str) -> ProviderResult<()> {
        self.ec2_client
            .disassociate_route_table()
            .association_id(association_id)
            .send()
            .await
            .map_err(|e| {
                sdk_error(
                    "disassociate route table",
                    ResourceKind::RouteTableAssociation,
                    e,
                )
            })?;
        log::info!("Disassociated route table association {}", association_id);
        Ok(())
    }

    // ========== EC2 Route Operations ==========

    pub(crate) async fn create_route(
        &self,
        route_table_id: &str,
        destination_cidr_block: &str,
        gateway_id: &str,
    ) -> ProviderResult<State> {
        self.ec2_client
            .create_route()
            .route_table_id(route_table_id)
            .destination_cidr_block(destination_cidr_block)
            .gateway_id(gateway_id)
            .send()
            .await
            .map_err(|e| sdk_error("create route", ResourceKind::Route, e))?;

        log::info!(
            "Created route {} -> {} in {}",
            destination_cidr_block,
            gateway_id,
            route_table_id
        );
        Ok(
            State::new(
                ResourceKind::Route,
                route_identifier(route_table_id, destination_cidr_block),
            )
            .with_attribute(attr::ROUTE_TABLE_ID, route_table_id)
            .with_attribute(attr::DESTINATION_CIDR_BLOCK, destination_cidr_block)
            .with_attribute(attr::GATEWAY_ID, gateway_id),
        )
    }

    pub(crate) async fn delete_route(&self, target: &State) -> ProviderResult<()> {
        let route_table_id = required_attribute(target, attr::ROUTE_TABLE_ID)?;
        let destination = required_attribute(target, attr::DESTINATION_CIDR_BLOCK)?;

        self.ec2_client
            .delete_route()
            .route_table_id(route_table_id)
            .destination_cidr_block(destination)
            .send()
            .await
            .map_err(|e| sdk_error("delete route", ResourceKind::Route, e))?;
        log::info!("Deleted route {} from {}", destination, route_table_id);
        Ok(())
    }

    // ========== EC2 Internet Gateway Operations ==========

    /// Gateways and their attachments share DescribeInternetGateways
    pub(crate) async fn describe_internet_gateways(
        &self,
        kind: ResourceKind,
        filters: &Filters,
        next_token: Option<String>,
    ) -> ProviderResult<Page<State>> {
        let result = self
            .ec2_client
            .describe_internet_gateways()
            .set_filters(request_filters(kind, filters))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("describe internet gateways", kind, e))?;

        let gateways = result.internet_gateways();
        let items = match kind {
            ResourceKind::GatewayAttachment => {
                gateways.iter().flat_map(attachment_states).collect()
            }
            _ => gateways.iter().filter_map(gateway_state).collect(),
        };
        Ok(page_of(items, result.next_token()))
    }

    pub(crate) async fn create_internet_gateway(&self, tags: &Tags) -> ProviderResult<State> {
        let kind = ResourceKind::InternetGateway;
        let result = self
            .ec2_client
            .create_internet_gateway()
            .tag_specifications(tag_specification(ResourceType::InternetGateway, tags))
            .send()
            .await
            .map_err(|e| sdk_error("create internet gateway", kind, e))?;

        let state = result
            .internet_gateway()
            .and_then(gateway_state)
            .ok_or_else(|| missing_field(kind, "internet gateway ID"))?
            .with_tags(tags.clone());

        log::info!("Created internet gateway {}", state.identifier);
        Ok(state)
    }

    pub(crate) async fn delete_internet_gateway(&self, gateway_id: &str) -> ProviderResult<()> {
        self.ec2_client
            .delete_internet_gateway()
            .internet_gateway_id(gateway_id)
            .send()
            .await
            .map_err(|e| sdk_error("delete internet gateway", ResourceKind::InternetGateway, e))?;
        log::info!("Deleted internet gateway {}", gateway_id);
        Ok(())
    }

    pub(crate) async fn attach_internet_gateway(
        &self,
        gateway_id: &str,
        vpc_id: &str,
    ) -> ProviderResult<State> {
        self.ec2_client
            .attach_internet_gateway()
            .internet_gateway_id(gateway_id)
            .vpc_id(vpc_id)
            .send()
            .await
            .map_err(|e| {
                sdk_error(
                    "attach internet gateway",
                    ResourceKind::GatewayAttachment,
                    e,
                )
            })?;

        log::info!("Attached internet gateway {} to {}", gateway_id, vpc_id);
        Ok(State::new(
            ResourceKind::GatewayAttachment,
            attachment_identifier(gateway_id, vpc_id),
        )
        .with_attribute(attr::GATEWAY_ID, gateway_id)
        .with_attribute(attr::VPC_ID, vpc_id)
        .with_attribute(attr::STATE, "attached"))
    }

    pub(crate) async fn detach_internet_gateway(&self, target: &State) -> ProviderResult<()> {
        let gateway_id = required_attribute(target, attr::GATEWAY_ID)?;
        let vpc_id = required_attribute(target, attr::VPC_ID)?;

        self.ec2_client
            .detach_internet_gateway()
            .internet_gateway_id(gateway_id)
            .vpc_id(vpc_id)
            .send()
            .await
            .map_err(|e| {
                sdk_error(
                    "detach internet gateway",
                    ResourceKind::GatewayAttachment,
                    e,
                )
            })?;
        log::info!("Detached internet gateway {} from {}", gateway_id, vpc_id);
        Ok(())
    }
}

// ========== Response conversion ==========

fn vpc_state(vpc: &Vpc) -> Option<State> {
    let mut state = State::new(ResourceKind::Network, vpc.vpc_id()?)
        .with_tags(from_ec2_tags(vpc.tags()));
    if let Some(cidr) = vpc.cidr_block() {
        state = state.with_attribute(attr::CIDR_BLOCK, cidr);
    }
    if let Some(s) = vpc.state() {
        state = state.with_attribute(attr::STATE, s.as_str());
    }
    Some(state)
}

fn subnet_state(subnet: &Subnet) -> Option<State> {
    let mut state = State::new(ResourceKind::Subnet, subnet.subnet_id()?)
        .with_tags(from_ec2_tags(subnet.tags()));
    if let Some(vpc_id) = subnet.vpc_id() {
        state = state.with_attribute(attr::VPC_ID, vpc_id);
    }
    if let Some(cidr) = subnet.cidr_block() {
        state = state.with_attribute(attr::CIDR_BLOCK, cidr);
    }
    if let Some(az) = subnet.availability_zone() {
        state = state.with_attribute(attr::AVAILABILITY_ZONE, az);
    }
    if let Some(s) = subnet.state() {
        state = state.with_attribute(attr::STATE, s.as_str());
    }
    Some(state)
}

fn route_table_state(table: &RouteTable) -> Option<State> {
    let main = table
        .associations()
        .iter()
        .any(|a| a.main().unwrap_or(false));
    let mut state = State::new(ResourceKind::RouteTable, table.route_table_id()?)
        .with_attribute(attr::MAIN, main.to_string())
        .with_tags(from_ec2_tags(table.tags()));
    if let Some(vpc_id) = table.vpc_id() {
        state = state.with_attribute(attr::VPC_ID, vpc_id);
    }
    Some(state)
}

fn association_states(table: &RouteTable) -> Vec<State> {
    let Some(route_table_id) = table.route_table_id() else {
        return Vec::new();
    };
    table
        .associations()
        .iter()
        .filter_map(|association| {
            let mut state = State::new(
                ResourceKind::RouteTableAssociation,
                association.route_table_association_id()?,
            )
            .with_attribute(attr::ROUTE_TABLE_ID, route_table_id)
            .with_attribute(
                attr::MAIN,
                association.main().unwrap_or(false).to_string(),
            );
            if let Some(vpc_id) = table.vpc_id() {
                state = state.with_attribute(attr::VPC_ID, vpc_id);
            }
            if let Some(subnet_id) = association.subnet_id() {
                state = state.with_attribute(attr::SUBNET_ID, subnet_id);
            }
            if let Some(gateway_id) = association.gateway_id() {
                state = state.with_attribute(attr::GATEWAY_ID, gateway_id);
            }
            if let Some(s) = association.association_state().and_then(|s| s.state()) {
                state = state.with_attribute(attr::STATE, s.as_str());
            }
            Some(state)
        })
        .collect()
}

/// IPv4 routes of a table; prefix-list and IPv6 routes are not modeled
fn route_states(table: &RouteTable) -> Vec<State> {
    let Some(route_table_id) = table.route_table_id() else {
        return Vec::new();
    };
    table
        .routes()
        .iter()
        .filter_map(|route| {
            let destination = route.destination_cidr_block()?;
            let mut state = State::new(
                ResourceKind::Route,
                route_identifier(route_table_id, destination),
            )
            .with_attribute(attr::ROUTE_TABLE_ID, route_table_id)
            .with_attribute(attr::DESTINATION_CIDR_BLOCK, destination);
            if let Some(gateway_id) = route.gateway_id() {
                state = state.with_attribute(attr::GATEWAY_ID, gateway_id);
            }
            if let Some(s) = route.state() {
                state = state.with_attribute(attr::STATE, s.as_str());
            }
            Some(state)
        })
        .collect()
}

fn gateway_state(gateway: &InternetGateway) -> Option<State> {
    let mut state = State::new(
        ResourceKind::InternetGateway,
        gateway.internet_gateway_id()?,
    )
    .with_attribute(attr::GATEWAY_ID, gateway.internet_gateway_id()?)
    .with_tags(from_ec2_tags(gateway.tags()));
    if let Some(vpc_id) = gateway.attachments().first().and_then(|a| a.vpc_id()) {
        state = state.with_attribute(attr::VPC_ID, vpc_id);
    }
    Some(state)
}

fn attachment_states(gateway: &InternetGateway) -> Vec<State> {
    let Some(gateway_id) = gateway.internet_gateway_id() else {
        return Vec::new();
    };
    gateway
        .attachments()
        .iter()
        .filter_map(|attachment| {
            let vpc_id = attachment.vpc_id()?;
            let mut state = State::new(
                ResourceKind::GatewayAttachment,
                attachment_identifier(gateway_id, vpc_id),
            )
            .with_attribute(attr::GATEWAY_ID, gateway_id)
            .with_attribute(attr::VPC_ID, vpc_id);
            if let Some(s) = attachment.state() {
                state = state.with_attribute(attr::STATE, s.as_str());
            }
            Some(state)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{
        InternetGatewayAttachment, Route, RouteTableAssociation, Tag,
    };

    fn name_tag(value: &str) -> Tag {
        Tag::builder().key("Name").value(value).build()
    }

    #[test]
    fn vpc_state_reads_cidr_and_tags() {
        let vpc = Vpc::builder()
            .vpc_id("vpc-1")
            .cidr_block("10.0.0.0/16")
            .tags(name_tag("Test"))
            .tags(Tag::builder().key("Environment").value("Dev").build())
            .build();
        let state = vpc_state(&vpc).unwrap();
        assert_eq!(state.identifier, "vpc-1");
        assert_eq!(state.attribute(attr::CIDR_BLOCK), Some("10.0.0.0/16"));
        assert_eq!(state.tags, Tags::named("Test", "Dev"));
    }

    #[test]
    fn vpc_without_id_is_skipped() {
        let vpc = Vpc::builder().cidr_block("10.0.0.0/16").build();
        assert!(vpc_state(&vpc).is_none());
    }

    fn sample_table() -> RouteTable {
        RouteTable::builder()
            .route_table_id("rtb-1")
            .vpc_id("vpc-1")
            .associations(
                RouteTableAssociation::builder()
                    .route_table_association_id("rtbassoc-1")
                    .subnet_id("subnet-1")
                    .main(false)
                    .build(),
            )
            .associations(
                RouteTableAssociation::builder()
                    .route_table_association_id("rtbassoc-main")
                    .main(true)
                    .build(),
            )
            .routes(
                Route::builder()
                    .destination_cidr_block("10.0.0.0/16")
                    .gateway_id("local")
                    .build(),
            )
            .routes(
                Route::builder()
                    .destination_cidr_block("0.0.0.0/0")
                    .gateway_id("igw-1")
                    .build(),
            )
            .routes(
                Route::builder()
                    .destination_ipv6_cidr_block("::/0")
                    .gateway_id("igw-1")
                    .build(),
            )
            .tags(name_tag("Test-rtb"))
            .build()
    }

    #[test]
    fn route_table_flattens_into_associations_and_routes() {
        let table = sample_table();

        let state = route_table_state(&table).unwrap();
        assert_eq!(state.attribute(attr::MAIN), Some("true"));
        assert_eq!(state.attribute(attr::VPC_ID), Some("vpc-1"));

        let associations = association_states(&table);
        assert_eq!(associations.len(), 2);
        assert_eq!(associations[0].attribute(attr::SUBNET_ID), Some("subnet-1"));
        assert!(!associations[0].is_main_association());
        assert!(associations[1].is_main_association());

        let routes = route_states(&table);
        let ids: Vec<&str> = routes.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["rtb-1:10.0.0.0/16", "rtb-1:0.0.0.0/0"]);
        assert_eq!(routes[1].attribute(attr::GATEWAY_ID), Some("igw-1"));
    }

    #[test]
    fn gateway_attachments_use_composite_identifiers() {
        let gateway = InternetGateway::builder()
            .internet_gateway_id("igw-1")
            .attachments(InternetGatewayAttachment::builder().vpc_id("vpc-1").build())
            .tags(name_tag("Test-igw"))
            .build();

        let state = gateway_state(&gateway).unwrap();
        assert_eq!(state.attribute(attr::VPC_ID), Some("vpc-1"));

        let attachments = attachment_states(&gateway);
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].identifier, "igw-1:vpc-1");
        assert_eq!(attachments[0].attribute(attr::GATEWAY_ID), Some("igw-1"));
    }

    #[test]
    fn detached_gateway_has_no_attachment_states() {
        let gateway = InternetGateway::builder().internet_gateway_id("igw-2").build();
        assert!(attachment_states(&gateway).is_empty());
        assert_eq!(gateway_state(&gateway).unwrap().attribute(attr::VPC_ID), None);
    }
}
