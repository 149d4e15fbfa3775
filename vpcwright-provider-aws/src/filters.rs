//! Translation of core filters into EC2 describe filters
//!
//! Attributes without a server-side equivalent are left out of the request;
//! the core re-applies every filter to the returned states.

use aws_sdk_ec2::types::{Filter as Ec2Filter, ResourceType, Tag, TagSpecification};
use vpcwright_core::filter::{Filter, Filters};
use vpcwright_core::resource::{ResourceKind, attr};
use vpcwright_core::tags::Tags;

/// EC2 filter name for an attribute of `kind`, if the API supports one
fn attribute_filter_name(kind: ResourceKind, name: &str) -> Option<&'static str> {
    let mapped = match (kind, name) {
        (ResourceKind::Network, attr::ID) => "vpc-id",
        (ResourceKind::Subnet, attr::ID) => "subnet-id",
        (ResourceKind::RouteTable, attr::ID) => "route-table-id",
        (ResourceKind::RouteTableAssociation, attr::ID) => "association.route-table-association-id",
        (ResourceKind::InternetGateway, attr::ID) => "internet-gateway-id",
        (ResourceKind::SecurityGroup, attr::ID) => "group-id",
        (ResourceKind::SecurityGroupRule, attr::ID) => "security-group-rule-id",
        (ResourceKind::KeyPair, attr::ID) => "key-pair-id",
        (ResourceKind::Instance, attr::ID) => "instance-id",
        (ResourceKind::Image, attr::ID) => "image-id",

        (ResourceKind::Network, attr::CIDR_BLOCK) => "cidr-block",
        (ResourceKind::Network, attr::VPC_ID) => "vpc-id",
        (ResourceKind::Network, attr::STATE) => "state",

        (ResourceKind::Subnet, attr::CIDR_BLOCK) => "cidr-block",
        (ResourceKind::Subnet, attr::VPC_ID) => "vpc-id",
        (ResourceKind::Subnet, attr::SUBNET_ID) => "subnet-id",
        (ResourceKind::Subnet, attr::AVAILABILITY_ZONE) => "availability-zone",

        (ResourceKind::RouteTable, attr::VPC_ID) => "vpc-id",
        (ResourceKind::RouteTable, attr::ROUTE_TABLE_ID) => "route-table-id",
        (ResourceKind::RouteTable, attr::MAIN) => "association.main",

        // Associations and routes are read through their route table
        (ResourceKind::RouteTableAssociation, attr::ROUTE_TABLE_ID) => "route-table-id",
        (ResourceKind::RouteTableAssociation, attr::SUBNET_ID) => "association.subnet-id",
        (ResourceKind::RouteTableAssociation, attr::VPC_ID) => "vpc-id",
        (ResourceKind::Route, attr::ROUTE_TABLE_ID) => "route-table-id",
        (ResourceKind::Route, attr::DESTINATION_CIDR_BLOCK) => "route.destination-cidr-block",
        (ResourceKind::Route, attr::GATEWAY_ID) => "route.gateway-id",

        (ResourceKind::InternetGateway, attr::GATEWAY_ID) => "internet-gateway-id",
        (ResourceKind::InternetGateway, attr::VPC_ID) => "attachment.vpc-id",
        (ResourceKind::GatewayAttachment, attr::GATEWAY_ID) => "internet-gateway-id",
        (ResourceKind::GatewayAttachment, attr::VPC_ID) => "attachment.vpc-id",

        (ResourceKind::SecurityGroup, attr::VPC_ID) => "vpc-id",
        (ResourceKind::SecurityGroup, attr::GROUP_ID) => "group-id",
        (ResourceKind::SecurityGroup, attr::GROUP_NAME) => "group-name",
        (ResourceKind::SecurityGroupRule, attr::GROUP_ID) => "group-id",

        (ResourceKind::KeyPair, attr::KEY_NAME) => "key-name",
        (ResourceKind::KeyPair, attr::KEY_PAIR_ID) => "key-pair-id",

        (ResourceKind::Instance, attr::VPC_ID) => "vpc-id",
        (ResourceKind::Instance, attr::SUBNET_ID) => "subnet-id",
        (ResourceKind::Instance, attr::IMAGE_ID) => "image-id",
        (ResourceKind::Instance, attr::INSTANCE_TYPE) => "instance-type",
        (ResourceKind::Instance, attr::KEY_NAME) => "key-name",
        (ResourceKind::Instance, attr::STATE) => "instance-state-name",

        (ResourceKind::Image, attr::IMAGE_ID) => "image-id",
        (ResourceKind::Image, attr::IMAGE_NAME) => "name",
        (ResourceKind::Image, attr::STATE) => "state",

        _ => return None,
    };
    Some(mapped)
}

/// Kinds whose describe call returns the tagged object itself
fn supports_tag_filters(kind: ResourceKind) -> bool {
    matches!(
        kind,
        ResourceKind::Network
            | ResourceKind::Subnet
            | ResourceKind::RouteTable
            | ResourceKind::InternetGateway
            | ResourceKind::SecurityGroup
            | ResourceKind::SecurityGroupRule
            | ResourceKind::KeyPair
            | ResourceKind::Instance
            | ResourceKind::Image
    )
}

/// Server-side filters for a describe call on `kind`
pub fn ec2_filters(kind: ResourceKind, filters: &Filters) -> Vec<Ec2Filter> {
    filters
        .iter()
        .filter_map(|filter| match filter {
            Filter::Tag { key, value } if supports_tag_filters(kind) => Some(
                Ec2Filter::builder()
                    .name(format!("tag:{}", key))
                    .values(value)
                    .build(),
            ),
            Filter::Tag { .. } => None,
            Filter::Attribute { name, value } => attribute_filter_name(kind, name)
                .map(|n| Ec2Filter::builder().name(n).values(value).build()),
        })
        .collect()
}

/// `ec2_filters`, or `None` when there is nothing to send
pub fn request_filters(kind: ResourceKind, filters: &Filters) -> Option<Vec<Ec2Filter>> {
    let translated = ec2_filters(kind, filters);
    if translated.is_empty() {
        None
    } else {
        Some(translated)
    }
}

/// TagSpecification applying `tags` to the created resource
pub fn tag_specification(resource_type: ResourceType, tags: &Tags) -> TagSpecification {
    tags.iter()
        .fold(
            TagSpecification::builder().resource_type(resource_type),
            |builder, (key, value)| builder.tags(Tag::builder().key(key).value(value).build()),
        )
        .build()
}

/// Collect EC2 tags into core tags
pub fn from_ec2_tags(tags: &[Tag]) -> Tags {
    tags.iter()
        .filter_map(|t| Some((t.key()?, t.value().unwrap_or_default())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(filters: &[Ec2Filter]) -> Vec<(&str, Vec<&str>)> {
        filters
            .iter()
            .map(|f| {
                (
                    f.name().unwrap_or_default(),
                    f.values().iter().map(String::as_str).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn network_filters_translate_to_ec2_names() {
        let filters = Filters::new()
            .attribute(attr::CIDR_BLOCK, "10.0.0.0/16")
            .tag("Name", "Test")
            .tag("Environment", "Dev");
        let translated = ec2_filters(ResourceKind::Network, &filters);
        assert_eq!(
            names(&translated),
            vec![
                ("cidr-block", vec!["10.0.0.0/16"]),
                ("tag:Name", vec!["Test"]),
                ("tag:Environment", vec!["Dev"]),
            ]
        );
    }

    #[test]
    fn route_tags_are_not_sent_to_route_tables() {
        let filters = Filters::new()
            .attribute(attr::ROUTE_TABLE_ID, "rtb-1")
            .attribute(attr::DESTINATION_CIDR_BLOCK, "0.0.0.0/0")
            .tag("Name", "ignored");
        let translated = ec2_filters(ResourceKind::Route, &filters);
        assert_eq!(
            names(&translated),
            vec![
                ("route-table-id", vec!["rtb-1"]),
                ("route.destination-cidr-block", vec!["0.0.0.0/0"]),
            ]
        );
    }

    #[test]
    fn unmapped_attributes_are_client_side_only() {
        let filters = Filters::new()
            .attribute(attr::GROUP_ID, "sg-1")
            .attribute(attr::FROM_PORT, "22");
        let translated = ec2_filters(ResourceKind::SecurityGroupRule, &filters);
        assert_eq!(names(&translated), vec![("group-id", vec!["sg-1"])]);
    }

    #[test]
    fn identifier_filters_use_per_kind_names() {
        let by_id = |kind| ec2_filters(kind, &Filters::new().attribute(attr::ID, "x-1"));
        assert_eq!(names(&by_id(ResourceKind::Subnet)), vec![("subnet-id", vec!["x-1"])]);
        assert_eq!(names(&by_id(ResourceKind::KeyPair)), vec![("key-pair-id", vec!["x-1"])]);
        assert!(by_id(ResourceKind::Route).is_empty());
    }

    #[test]
    fn tag_specification_carries_every_tag() {
        let spec = tag_specification(ResourceType::Vpc, &Tags::named("Test", "Dev"));
        assert_eq!(spec.resource_type(), Some(&ResourceType::Vpc));
        assert_eq!(spec.tags().len(), 2);
        assert_eq!(from_ec2_tags(spec.tags()), Tags::named("Test", "Dev"));
    }
}
