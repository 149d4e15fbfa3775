//! Resource - Resource kinds, desired specs and observed state

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cidr;
use crate::error::{ProvisionError, ProvisionResult};
use crate::filter::{Filter, Filters};
use crate::tags::{self, Tags};

/// Kind of provider resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Network,
    Subnet,
    RouteTable,
    RouteTableAssociation,
    InternetGateway,
    GatewayAttachment,
    Route,
    SecurityGroup,
    SecurityGroupRule,
    KeyPair,
    Instance,
    Image,
    InstanceType,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 13] = [
        ResourceKind::Network,
        ResourceKind::Subnet,
        ResourceKind::RouteTable,
        ResourceKind::RouteTableAssociation,
        ResourceKind::InternetGateway,
        ResourceKind::GatewayAttachment,
        ResourceKind::Route,
        ResourceKind::SecurityGroup,
        ResourceKind::SecurityGroupRule,
        ResourceKind::KeyPair,
        ResourceKind::Instance,
        ResourceKind::Image,
        ResourceKind::InstanceType,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Network => "vpc",
            ResourceKind::Subnet => "subnet",
            ResourceKind::RouteTable => "route_table",
            ResourceKind::RouteTableAssociation => "route_table_association",
            ResourceKind::InternetGateway => "internet_gateway",
            ResourceKind::GatewayAttachment => "gateway_attachment",
            ResourceKind::Route => "route",
            ResourceKind::SecurityGroup => "security_group",
            ResourceKind::SecurityGroupRule => "security_group_rule",
            ResourceKind::KeyPair => "key_pair",
            ResourceKind::Instance => "instance",
            ResourceKind::Image => "image",
            ResourceKind::InstanceType => "instance_type",
        }
    }

    /// Kinds created with `Name` + `Environment` tags
    pub fn carries_tags(&self) -> bool {
        matches!(
            self,
            ResourceKind::Network
                | ResourceKind::Subnet
                | ResourceKind::RouteTable
                | ResourceKind::InternetGateway
                | ResourceKind::SecurityGroup
                | ResourceKind::Instance
        )
    }

    /// Kinds whose existence check includes the `Name` + `Environment` pair
    pub fn gates_on_tags(&self) -> bool {
        self.carries_tags() && *self != ResourceKind::Instance
    }

    /// Kinds that can only be listed, never created or deleted
    pub fn is_read_only(&self) -> bool {
        matches!(self, ResourceKind::Image | ResourceKind::InstanceType)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attribute names shared by specs, filters and observed state
pub mod attr {
    /// Matches the provider-assigned identifier rather than a stored attribute
    pub const ID: &str = "id";
    pub const CIDR_BLOCK: &str = "cidr_block";
    pub const VPC_ID: &str = "vpc_id";
    pub const SUBNET_ID: &str = "subnet_id";
    pub const AVAILABILITY_ZONE: &str = "availability_zone";
    pub const ROUTE_TABLE_ID: &str = "route_table_id";
    pub const DESTINATION_CIDR_BLOCK: &str = "destination_cidr_block";
    pub const GATEWAY_ID: &str = "gateway_id";
    pub const GROUP_ID: &str = "group_id";
    pub const GROUP_NAME: &str = "group_name";
    pub const DESCRIPTION: &str = "description";
    pub const DIRECTION: &str = "direction";
    pub const PROTOCOL: &str = "protocol";
    pub const FROM_PORT: &str = "from_port";
    pub const TO_PORT: &str = "to_port";
    pub const SOURCE_CIDR: &str = "source_cidr";
    pub const SOURCE_GROUP_ID: &str = "source_group_id";
    pub const KEY_NAME: &str = "key_name";
    pub const KEY_PAIR_ID: &str = "key_pair_id";
    pub const KEY_FINGERPRINT: &str = "key_fingerprint";
    pub const KEY_MATERIAL: &str = "key_material";
    pub const MAIN: &str = "main";
    pub const STATE: &str = "state";
    pub const IMAGE_ID: &str = "image_id";
    pub const IMAGE_NAME: &str = "image_name";
    pub const INSTANCE_TYPE: &str = "instance_type";
    pub const SECURITY_GROUP_IDS: &str = "security_group_ids";
    pub const PUBLIC_IP: &str = "public_ip";
    pub const PRIVATE_IP: &str = "private_ip";
    pub const USER_DATA: &str = "user_data";
    pub const ENABLE_DNS: &str = "enable_dns";
    pub const VCPUS: &str = "vcpus";
    pub const MEMORY_MIB: &str = "memory_mib";
}

/// Observed state of a resource as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub kind: ResourceKind,
    /// Provider-assigned identifier (or composite key for routes and attachments)
    pub identifier: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Tags,
}

impl State {
    pub fn new(kind: ResourceKind, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
            attributes: BTreeMap::new(),
            tags: Tags::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Name an operator would recognize: the Name tag, or whatever the kind is named by
    pub fn display_name(&self) -> Option<&str> {
        match self.kind {
            ResourceKind::SecurityGroup => self.attribute(attr::GROUP_NAME),
            ResourceKind::KeyPair => self.attribute(attr::KEY_NAME),
            ResourceKind::Image => self
                .tags
                .name()
                .or_else(|| self.attribute(attr::IMAGE_NAME)),
            ResourceKind::InstanceType => Some(self.identifier.as_str()),
            _ => self.tags.name(),
        }
    }

    /// True for the implicit association between a network and its main route table
    pub fn is_main_association(&self) -> bool {
        self.kind == ResourceKind::RouteTableAssociation && self.attribute(attr::MAIN) == Some("true")
    }
}

/// Composite identifier of a route
pub fn route_identifier(route_table_id: &str, destination_cidr_block: &str) -> String {
    format!("{}:{}", route_table_id, destination_cidr_block)
}

/// Composite identifier of a gateway attachment
pub fn attachment_identifier(gateway_id: &str, vpc_id: &str) -> String {
    format!("{}:{}", gateway_id, vpc_id)
}

/// Traffic direction of a security group rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ingress,
    Egress,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ingress => "ingress",
            Direction::Egress => "egress",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ingress" | "inbound" => Ok(Direction::Ingress),
            "egress" | "outbound" => Ok(Direction::Egress),
            _ => Err(ProvisionError::invalid(format!(
                "invalid direction '{}', expected ingress or egress",
                s
            ))),
        }
    }
}

/// IP protocol of a security group rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    All,
}

impl Protocol {
    /// Protocol string as the provider API spells it
    pub fn as_provider_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::All => "-1",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::All => f.write_str("all"),
            other => f.write_str(other.as_provider_str()),
        }
    }
}

impl FromStr for Protocol {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" | "6" => Ok(Protocol::Tcp),
            "udp" | "17" => Ok(Protocol::Udp),
            "icmp" | "1" => Ok(Protocol::Icmp),
            "all" | "-1" => Ok(Protocol::All),
            _ => Err(ProvisionError::invalid(format!(
                "invalid protocol '{}', expected tcp, udp, icmp or all",
                s
            ))),
        }
    }
}

/// Inclusive port range; `-1..-1` stands for "all ports"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRange {
    pub from: i32,
    pub to: i32,
}

impl PortRange {
    pub const ANY: PortRange = PortRange { from: -1, to: -1 };

    pub fn single(port: u16) -> Self {
        Self {
            from: i32::from(port),
            to: i32::from(port),
        }
    }

    pub fn new(from: u16, to: u16) -> ProvisionResult<Self> {
        if from > to {
            return Err(ProvisionError::invalid(format!(
                "port range start {} is greater than end {}",
                from, to
            )));
        }
        Ok(Self {
            from: i32::from(from),
            to: i32::from(to),
        })
    }

    pub fn is_any(&self) -> bool {
        *self == Self::ANY
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            f.write_str("*")
        } else if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}-{}", self.from, self.to)
        }
    }
}

impl FromStr for PortRange {
    type Err = ProvisionError;

    /// Accepts `22`, `8000-8080`, or `*` / `-1` / empty for all ports
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "*" || s == "-1" {
            return Ok(Self::ANY);
        }
        let parse_port = |p: &str| {
            p.trim().parse::<u16>().map_err(|_| {
                ProvisionError::invalid(format!("invalid port '{}', expected 0-65535", p))
            })
        };
        match s.split_once('-') {
            Some((from, to)) => Self::new(parse_port(from)?, parse_port(to)?),
            None => Ok(Self::single(parse_port(s)?)),
        }
    }
}

/// Origin of traffic for an ingress rule (destination for egress)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    Cidr(String),
    Group(String),
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::Cidr(cidr) => f.write_str(cidr),
            RuleSource::Group(group) => f.write_str(group),
        }
    }
}

impl FromStr for RuleSource {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("sg-") {
            Ok(RuleSource::Group(s.to_string()))
        } else {
            cidr::validate(s)?;
            Ok(RuleSource::Cidr(s.to_string()))
        }
    }
}

/// One security group rule: direction, protocol, ports and source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleSpec {
    pub direction: Direction,
    pub protocol: Protocol,
    pub ports: PortRange,
    pub source: RuleSource,
}

impl RuleSpec {
    pub fn new(
        direction: Direction,
        protocol: Protocol,
        ports: PortRange,
        source: RuleSource,
    ) -> ProvisionResult<Self> {
        let ports = match protocol {
            Protocol::All => PortRange::ANY,
            Protocol::Icmp => ports,
            Protocol::Tcp | Protocol::Udp if ports.is_any() => {
                return Err(ProvisionError::invalid(format!(
                    "{} rules need a port or port range",
                    protocol
                )));
            }
            Protocol::Tcp | Protocol::Udp => ports,
        };
        Ok(Self {
            direction,
            protocol,
            ports,
            source,
        })
    }

    /// Parse `protocol:ports:source`, e.g. `tcp:22:0.0.0.0/0` or `all:*:sg-123`
    pub fn parse(direction: Direction, s: &str) -> ProvisionResult<Self> {
        let parts: Vec<&str> = s.splitn(3, ':').collect();
        let [protocol, ports, source] = parts.as_slice() else {
            return Err(ProvisionError::invalid(format!(
                "invalid rule '{}', expected protocol:ports:source",
                s
            )));
        };
        Self::new(direction, protocol.parse()?, ports.parse()?, source.parse()?)
    }

    pub fn attributes(&self) -> BTreeMap<String, String> {
        let mut attributes = BTreeMap::new();
        attributes.insert(attr::DIRECTION.to_string(), self.direction.to_string());
        attributes.insert(
            attr::PROTOCOL.to_string(),
            self.protocol.as_provider_str().to_string(),
        );
        attributes.insert(attr::FROM_PORT.to_string(), self.ports.from.to_string());
        attributes.insert(attr::TO_PORT.to_string(), self.ports.to.to_string());
        match &self.source {
            RuleSource::Cidr(cidr) => {
                attributes.insert(attr::SOURCE_CIDR.to_string(), cidr.clone());
            }
            RuleSource::Group(group) => {
                attributes.insert(attr::SOURCE_GROUP_ID.to_string(), group.clone());
            }
        }
        attributes
    }
}

impl fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{} {}",
            self.direction, self.protocol, self.ports, self.source
        )
    }
}

/// Launch parameters for compute instances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub image_id: String,
    pub instance_type: String,
    pub key_name: String,
    pub subnet_id: String,
    pub security_group_ids: Vec<String>,
    /// Raw user-data script, encoded by the provider
    pub user_data: Option<String>,
}

/// Desired resource, one variant per creatable kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSpec {
    Network {
        cidr_block: String,
        enable_dns: bool,
    },
    Subnet {
        vpc_id: String,
        cidr_block: String,
        availability_zone: Option<String>,
    },
    RouteTable {
        vpc_id: String,
    },
    RouteTableAssociation {
        route_table_id: String,
        subnet_id: String,
    },
    InternetGateway,
    GatewayAttachment {
        gateway_id: String,
        vpc_id: String,
    },
    Route {
        route_table_id: String,
        destination_cidr_block: String,
        gateway_id: String,
    },
    SecurityGroup {
        vpc_id: String,
        group_name: String,
        description: String,
    },
    SecurityGroupRule {
        group_id: String,
        rule: RuleSpec,
    },
    KeyPair {
        key_name: String,
    },
    Instance(InstanceSpec),
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSpec::Network { .. } => ResourceKind::Network,
            ResourceSpec::Subnet { .. } => ResourceKind::Subnet,
            ResourceSpec::RouteTable { .. } => ResourceKind::RouteTable,
            ResourceSpec::RouteTableAssociation { .. } => ResourceKind::RouteTableAssociation,
            ResourceSpec::InternetGateway => ResourceKind::InternetGateway,
            ResourceSpec::GatewayAttachment { .. } => ResourceKind::GatewayAttachment,
            ResourceSpec::Route { .. } => ResourceKind::Route,
            ResourceSpec::SecurityGroup { .. } => ResourceKind::SecurityGroup,
            ResourceSpec::SecurityGroupRule { .. } => ResourceKind::SecurityGroupRule,
            ResourceSpec::KeyPair { .. } => ResourceKind::KeyPair,
            ResourceSpec::Instance(_) => ResourceKind::Instance,
        }
    }

    /// Attributes the created resource will report
    pub fn attributes(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        let mut put = |k: &str, v: &str| {
            out.insert(k.to_string(), v.to_string());
        };
        match self {
            ResourceSpec::Network {
                cidr_block,
                enable_dns,
            } => {
                put(attr::CIDR_BLOCK, cidr_block);
                if *enable_dns {
                    put(attr::ENABLE_DNS, "true");
                }
            }
            ResourceSpec::Subnet {
                vpc_id,
                cidr_block,
                availability_zone,
            } => {
                put(attr::VPC_ID, vpc_id);
                put(attr::CIDR_BLOCK, cidr_block);
                if let Some(az) = availability_zone {
                    put(attr::AVAILABILITY_ZONE, az);
                }
            }
            ResourceSpec::RouteTable { vpc_id } => put(attr::VPC_ID, vpc_id),
            ResourceSpec::RouteTableAssociation {
                route_table_id,
                subnet_id,
            } => {
                put(attr::ROUTE_TABLE_ID, route_table_id);
                put(attr::SUBNET_ID, subnet_id);
                put(attr::MAIN, "false");
            }
            ResourceSpec::InternetGateway => {}
            ResourceSpec::GatewayAttachment { gateway_id, vpc_id } => {
                put(attr::GATEWAY_ID, gateway_id);
                put(attr::VPC_ID, vpc_id);
            }
            ResourceSpec::Route {
                route_table_id,
                destination_cidr_block,
                gateway_id,
            } => {
                put(attr::ROUTE_TABLE_ID, route_table_id);
                put(attr::DESTINATION_CIDR_BLOCK, destination_cidr_block);
                put(attr::GATEWAY_ID, gateway_id);
            }
            ResourceSpec::SecurityGroup {
                vpc_id,
                group_name,
                description,
            } => {
                put(attr::VPC_ID, vpc_id);
                put(attr::GROUP_NAME, group_name);
                put(attr::DESCRIPTION, description);
            }
            ResourceSpec::SecurityGroupRule { group_id, rule } => {
                put(attr::GROUP_ID, group_id);
                for (key, value) in rule.attributes() {
                    put(&key, &value);
                }
            }
            ResourceSpec::KeyPair { key_name } => put(attr::KEY_NAME, key_name),
            ResourceSpec::Instance(spec) => {
                put(attr::IMAGE_ID, &spec.image_id);
                put(attr::INSTANCE_TYPE, &spec.instance_type);
                put(attr::KEY_NAME, &spec.key_name);
                put(attr::SUBNET_ID, &spec.subnet_id);
                put(attr::SECURITY_GROUP_IDS, &spec.security_group_ids.join(","));
                if let Some(script) = &spec.user_data {
                    put(attr::USER_DATA, script);
                }
            }
        }
        out
    }

    /// Kind-specific identity filters, excluding the Name/Environment tags
    pub fn identity(&self) -> Filters {
        let attributes = self.attributes();
        let keys: &[&str] = match self {
            ResourceSpec::Network { .. } => &[attr::CIDR_BLOCK],
            ResourceSpec::Subnet { .. } => {
                &[attr::CIDR_BLOCK, attr::VPC_ID, attr::AVAILABILITY_ZONE]
            }
            ResourceSpec::RouteTable { .. } => &[attr::VPC_ID],
            ResourceSpec::RouteTableAssociation { .. } => {
                &[attr::ROUTE_TABLE_ID, attr::SUBNET_ID]
            }
            ResourceSpec::InternetGateway => &[],
            ResourceSpec::GatewayAttachment { .. } => &[attr::GATEWAY_ID, attr::VPC_ID],
            ResourceSpec::Route { .. } => &[attr::ROUTE_TABLE_ID, attr::DESTINATION_CIDR_BLOCK],
            ResourceSpec::SecurityGroup { .. } => &[attr::VPC_ID, attr::GROUP_NAME],
            ResourceSpec::SecurityGroupRule { .. } => &[
                attr::GROUP_ID,
                attr::DIRECTION,
                attr::PROTOCOL,
                attr::FROM_PORT,
                attr::TO_PORT,
                attr::SOURCE_CIDR,
                attr::SOURCE_GROUP_ID,
            ],
            ResourceSpec::KeyPair { .. } => &[attr::KEY_NAME],
            ResourceSpec::Instance(_) => &[],
        };
        keys.iter()
            .filter_map(|key| {
                attributes
                    .get(*key)
                    .map(|value| Filter::attribute(*key, value.clone()))
            })
            .collect()
    }

    /// Validate user-supplied values before any request is sent
    pub fn validate(&self) -> ProvisionResult<()> {
        fn required(field: &str, value: &str) -> ProvisionResult<()> {
            if value.trim().is_empty() {
                return Err(ProvisionError::invalid(format!("{} must not be empty", field)));
            }
            Ok(())
        }

        match self {
            ResourceSpec::Network { cidr_block, .. } => cidr::validate(cidr_block),
            ResourceSpec::Subnet {
                vpc_id,
                cidr_block,
                availability_zone,
            } => {
                required(attr::VPC_ID, vpc_id)?;
                if let Some(az) = availability_zone {
                    required(attr::AVAILABILITY_ZONE, az)?;
                }
                cidr::validate(cidr_block)
            }
            ResourceSpec::RouteTable { vpc_id } => required(attr::VPC_ID, vpc_id),
            ResourceSpec::RouteTableAssociation {
                route_table_id,
                subnet_id,
            } => {
                required(attr::ROUTE_TABLE_ID, route_table_id)?;
                required(attr::SUBNET_ID, subnet_id)
            }
            ResourceSpec::InternetGateway => Ok(()),
            ResourceSpec::GatewayAttachment { gateway_id, vpc_id } => {
                required(attr::GATEWAY_ID, gateway_id)?;
                required(attr::VPC_ID, vpc_id)
            }
            ResourceSpec::Route {
                route_table_id,
                destination_cidr_block,
                gateway_id,
            } => {
                required(attr::ROUTE_TABLE_ID, route_table_id)?;
                required(attr::GATEWAY_ID, gateway_id)?;
                cidr::validate(destination_cidr_block)
            }
            ResourceSpec::SecurityGroup {
                vpc_id,
                group_name,
                description,
            } => {
                required(attr::VPC_ID, vpc_id)?;
                required(attr::GROUP_NAME, group_name)?;
                required(attr::DESCRIPTION, description)
            }
            ResourceSpec::SecurityGroupRule { group_id, rule } => {
                required(attr::GROUP_ID, group_id)?;
                if let RuleSource::Cidr(cidr_block) = &rule.source {
                    cidr::validate(cidr_block)?;
                }
                Ok(())
            }
            ResourceSpec::KeyPair { key_name } => required(attr::KEY_NAME, key_name),
            ResourceSpec::Instance(spec) => {
                required(attr::IMAGE_ID, &spec.image_id)?;
                required(attr::INSTANCE_TYPE, &spec.instance_type)?;
                required(attr::KEY_NAME, &spec.key_name)?;
                required(attr::SUBNET_ID, &spec.subnet_id)
            }
        }
    }
}

/// A desired resource: per-kind spec plus the tags it is created with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub spec: ResourceSpec,
    #[serde(default)]
    pub tags: Tags,
}

impl Resource {
    pub fn new(spec: ResourceSpec) -> Self {
        Self {
            spec,
            tags: Tags::new(),
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.spec.kind()
    }

    /// Filters an existence check runs with: kind identity plus Name/Environment
    pub fn identity_filters(&self) -> Filters {
        let mut filters = self.spec.identity();
        if self.kind().gates_on_tags() {
            for key in [tags::NAME, tags::ENVIRONMENT] {
                filters.push(Filter::tag(key, self.tags.get(key).unwrap_or_default()));
            }
        }
        filters
    }
}
