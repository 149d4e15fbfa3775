//! Security group and security group rule operations

use aws_sdk_ec2::types::{
    IpPermission, IpRange, ResourceType, SecurityGroup, SecurityGroupRule, UserIdGroupPair,
};
use vpcwright_core::filter::Filters;
use vpcwright_core::paginate::Page;
use vpcwright_core::provider::{ProviderError, ProviderResult};
use vpcwright_core::resource::{Direction, ResourceKind, RuleSource, RuleSpec, State, attr};
use vpcwright_core::tags::Tags;

use crate::error::{missing_field, sdk_error};
use crate::filters::{from_ec2_tags, request_filters, tag_specification};
use crate::{AwsProvider, page_of, required_attribute};

impl AwsProvider {
    // ========== EC2 Security Group Operations ==========

    pub(crate) async fn describe_security_groups(
        &self,
        filters: &Filters,
        next_token: Option<String>,
    ) -> ProviderResult<Page<State>> {
        let kind = ResourceKind::SecurityGroup;
        let result = self
            .ec2_client
            .describe_security_groups()
            .set_filters(request_filters(kind, filters))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("describe security groups", kind, e))?;

        let items = result
            .security_groups()
            .iter()
            .filter_map(security_group_state)
            .collect();
        Ok(page_of(items, result.next_token()))
    }

    pub(crate) async fn create_security_group(
        &self,
        vpc_id: &str,
        group_name: &str,
        description: &str,
        tags: &Tags,
    ) -> ProviderResult<State> {
        let kind = ResourceKind::SecurityGroup;
        let result = self
            .ec2_client
            .create_security_group()
            .vpc_id(vpc_id)
            .group_name(group_name)
            .description(description)
            .tag_specifications(tag_specification(ResourceType::SecurityGroup, tags))
            .send()
            .await
            .map_err(|e| sdk_error("create security group", kind, e))?;

        let group_id = result
            .group_id()
            .ok_or_else(|| missing_field(kind, "security group ID"))?;

        log::info!("Created security group {} ({}) in {}", group_id, group_name, vpc_id);
        Ok(State::new(kind, group_id)
            .with_attribute(attr::GROUP_ID, group_id)
            .with_attribute(attr::GROUP_NAME, group_name)
            .with_attribute(attr::VPC_ID, vpc_id)
            .with_attribute(attr::DESCRIPTION, description)
            .with_tags(tags.clone()))
    }

    pub(crate) async fn delete_security_group(&self, group_id: &str) -> ProviderResult<()> {
        self.ec2_client
            .delete_security_group()
            .group_id(group_id)
            .send()
            .await
            .map_err(|e| sdk_error("delete security group", ResourceKind::SecurityGroup, e))?;
        log::info!("Deleted security group {}", group_id);
        Ok(())
    }

    // ========== EC2 Security Group Rule Operations ==========

    pub(crate) async fn describe_security_group_rules(
        &self,
        filters: &Filters,
        next_token: Option<String>,
    ) -> ProviderResult<Page<State>> {
        let kind = ResourceKind::SecurityGroupRule;
        let result = self
            .ec2_client
            .describe_security_group_rules()
            .set_filters(request_filters(kind, filters))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("describe security group rules", kind, e))?;

        let items = result
            .security_group_rules()
            .iter()
            .filter_map(rule_state)
            .collect();
        Ok(page_of(items, result.next_token()))
    }

    pub(crate) async fn authorize_rule(
        &self,
        group_id: &str,
        rule: &RuleSpec,
    ) -> ProviderResult<State> {
        let kind = ResourceKind::SecurityGroupRule;
        let permission = ip_permission(rule);

        let created = match rule.direction {
            Direction::Ingress => self
                .ec2_client
                .authorize_security_group_ingress()
                .group_id(group_id)
                .ip_permissions(permission)
                .send()
                .await
                .map_err(|e| sdk_error("authorize ingress rule", kind, e))?
                .security_group_rules()
                .first()
                .and_then(rule_state),
            Direction::Egress => self
                .ec2_client
                .authorize_security_group_egress()
                .group_id(group_id)
                .ip_permissions(permission)
                .send()
                .await
                .map_err(|e| sdk_error("authorize egress rule", kind, e))?
                .security_group_rules()
                .first()
                .and_then(rule_state),
        };

        let state = created.ok_or_else(|| missing_field(kind, "security group rule ID"))?;
        log::info!("Authorized {} on {} ({})", rule, group_id, state.identifier);
        Ok(state)
    }

    pub(crate) async fn revoke_rule(&self, target: &State) -> ProviderResult<()> {
        let kind = ResourceKind::SecurityGroupRule;
        let group_id = required_attribute(target, attr::GROUP_ID)?;
        let direction: Direction = required_attribute(target, attr::DIRECTION)?
            .parse()
            .map_err(|e| ProviderError::invalid_input(format!("{}", e)).for_resource(kind))?;

        match direction {
            Direction::Ingress => {
                self.ec2_client
                    .revoke_security_group_ingress()
                    .group_id(group_id)
                    .security_group_rule_ids(&target.identifier)
                    .send()
                    .await
                    .map_err(|e| sdk_error("revoke ingress rule", kind, e))?;
            }
            Direction::Egress => {
                self.ec2_client
                    .revoke_security_group_egress()
                    .group_id(group_id)
                    .security_group_rule_ids(&target.identifier)
                    .send()
                    .await
                    .map_err(|e| sdk_error("revoke egress rule", kind, e))?;
            }
        }
        log::info!("Revoked rule {} on {}", target.identifier, group_id);
        Ok(())
    }
}

fn ip_permission(rule: &RuleSpec) -> IpPermission {
    let builder = IpPermission::builder()
        .ip_protocol(rule.protocol.as_provider_str())
        .from_port(rule.ports.from)
        .to_port(rule.ports.to);
    match &rule.source {
        RuleSource::Cidr(cidr) => builder.ip_ranges(IpRange::builder().cidr_ip(cidr).build()),
        RuleSource::Group(group_id) => {
            builder.user_id_group_pairs(UserIdGroupPair::builder().group_id(group_id).build())
        }
    }
    .build()
}

// ========== Response conversion ==========

fn security_group_state(group: &SecurityGroup) -> Option<State> {
    let group_id = group.group_id()?;
    let mut state = State::new(ResourceKind::SecurityGroup, group_id)
        .with_attribute(attr::GROUP_ID, group_id)
        .with_tags(from_ec2_tags(group.tags()));
    if let Some(name) = group.group_name() {
        state = state.with_attribute(attr::GROUP_NAME, name);
    }
    if let Some(vpc_id) = group.vpc_id() {
        state = state.with_attribute(attr::VPC_ID, vpc_id);
    }
    if let Some(description) = group.description() {
        state = state.with_attribute(attr::DESCRIPTION, description);
    }
    Some(state)
}

/// Rule state carrying the same identity attributes `RuleSpec::attributes` produces
fn rule_state(rule: &SecurityGroupRule) -> Option<State> {
    let direction = if rule.is_egress().unwrap_or(false) {
        Direction::Egress
    } else {
        Direction::Ingress
    };
    let mut state = State::new(
        ResourceKind::SecurityGroupRule,
        rule.security_group_rule_id()?,
    )
    .with_attribute(attr::GROUP_ID, rule.group_id()?)
    .with_attribute(attr::DIRECTION, direction.as_str())
    .with_attribute(attr::PROTOCOL, rule.ip_protocol().unwrap_or("-1"))
    .with_attribute(attr::FROM_PORT, rule.from_port().unwrap_or(-1).to_string())
    .with_attribute(attr::TO_PORT, rule.to_port().unwrap_or(-1).to_string())
    .with_tags(from_ec2_tags(rule.tags()));
    if let Some(cidr) = rule.cidr_ipv4() {
        state = state.with_attribute(attr::SOURCE_CIDR, cidr);
    }
    if let Some(group_id) = rule.referenced_group_info().and_then(|g| g.group_id()) {
        state = state.with_attribute(attr::SOURCE_GROUP_ID, group_id);
    }
    Some(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::ReferencedSecurityGroup;
    use vpcwright_core::resource::{PortRange, Protocol};

    #[test]
    fn ingress_permission_for_cidr_source() {
        let rule = RuleSpec::parse(Direction::Ingress, "tcp:22:0.0.0.0/0").unwrap();
        let permission = ip_permission(&rule);
        assert_eq!(permission.ip_protocol(), Some("tcp"));
        assert_eq!(permission.from_port(), Some(22));
        assert_eq!(permission.to_port(), Some(22));
        assert_eq!(permission.ip_ranges()[0].cidr_ip(), Some("0.0.0.0/0"));
        assert!(permission.user_id_group_pairs().is_empty());
    }

    #[test]
    fn all_traffic_permission_from_group() {
        let rule = RuleSpec::new(
            Direction::Egress,
            Protocol::All,
            PortRange::single(80),
            RuleSource::Group("sg-2".into()),
        )
        .unwrap();
        let permission = ip_permission(&rule);
        assert_eq!(permission.ip_protocol(), Some("-1"));
        assert_eq!(permission.from_port(), Some(-1));
        assert_eq!(permission.user_id_group_pairs()[0].group_id(), Some("sg-2"));
    }

    #[test]
    fn rule_state_matches_spec_attributes() {
        let rule = SecurityGroupRule::builder()
            .security_group_rule_id("sgr-1")
            .group_id("sg-1")
            .is_egress(false)
            .ip_protocol("tcp")
            .from_port(443)
            .to_port(443)
            .cidr_ipv4("10.0.0.0/8")
            .build();
        let state = rule_state(&rule).unwrap();

        let spec = RuleSpec::parse(Direction::Ingress, "tcp:443:10.0.0.0/8").unwrap();
        for (key, value) in spec.attributes() {
            assert_eq!(state.attribute(&key), Some(value.as_str()), "{}", key);
        }
        assert_eq!(state.attribute(attr::GROUP_ID), Some("sg-1"));
    }

    #[test]
    fn rule_state_reads_referenced_group() {
        let rule = SecurityGroupRule::builder()
            .security_group_rule_id("sgr-2")
            .group_id("sg-1")
            .is_egress(true)
            .ip_protocol("-1")
            .from_port(-1)
            .to_port(-1)
            .referenced_group_info(ReferencedSecurityGroup::builder().group_id("sg-9").build())
            .build();
        let state = rule_state(&rule).unwrap();
        assert_eq!(state.attribute(attr::DIRECTION), Some("egress"));
        assert_eq!(state.attribute(attr::SOURCE_GROUP_ID), Some("sg-9"));
        assert_eq!(state.attribute(attr::SOURCE_CIDR), None);
    }

    #[test]
    fn security_group_state_carries_name_and_vpc() {
        let group = SecurityGroup::builder()
            .group_id("sg-1")
            .group_name("web")
            .vpc_id("vpc-1")
            .description("web tier")
            .build();
        let state = security_group_state(&group).unwrap();
        assert_eq!(state.identifier, "sg-1");
        assert_eq!(state.attribute(attr::GROUP_NAME), Some("web"));
        assert_eq!(state.attribute(attr::VPC_ID), Some("vpc-1"));
    }
}
