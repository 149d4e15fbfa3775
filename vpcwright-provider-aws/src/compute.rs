//! Key pair, instance, image and instance type operations

use aws_sdk_ec2::types::{
    Image, Instance, InstanceNetworkInterfaceSpecification, InstanceStateName, InstanceType,
    InstanceTypeInfo, KeyPairInfo, ResourceType,
};
use vpcwright_core::filter::Filters;
use vpcwright_core::paginate::Page;
use vpcwright_core::provider::ProviderResult;
use vpcwright_core::resource::{InstanceSpec, ResourceKind, State, attr};
use vpcwright_core::tags::Tags;

use crate::error::{missing_field, sdk_error};
use crate::filters::{from_ec2_tags, request_filters, tag_specification};
use crate::{AwsProvider, page_of};

impl AwsProvider {
    // ========== EC2 Key Pair Operations ==========

    /// DescribeKeyPairs is not paginated
    pub(crate) async fn describe_key_pairs(&self, filters: &Filters) -> ProviderResult<Page<State>> {
        let kind = ResourceKind::KeyPair;
        let result = self
            .ec2_client
            .describe_key_pairs()
            .set_filters(request_filters(kind, filters))
            .send()
            .await
            .map_err(|e| sdk_error("describe key pairs", kind, e))?;

        let items = result.key_pairs().iter().filter_map(key_pair_state).collect();
        Ok(Page::last(items))
    }

    /// The returned state carries the private key material; EC2 never
    /// returns it again.
    pub(crate) async fn create_key_pair(&self, key_name: &str) -> ProviderResult<State> {
        let kind = ResourceKind::KeyPair;
        let result = self
            .ec2_client
            .create_key_pair()
            .key_name(key_name)
            .send()
            .await
            .map_err(|e| sdk_error("create key pair", kind, e))?;

        let key_pair_id = result
            .key_pair_id()
            .ok_or_else(|| missing_field(kind, "key pair ID"))?;
        let mut state = State::new(kind, key_pair_id)
            .with_attribute(attr::KEY_PAIR_ID, key_pair_id)
            .with_attribute(attr::KEY_NAME, result.key_name().unwrap_or(key_name));
        if let Some(fingerprint) = result.key_fingerprint() {
            state = state.with_attribute(attr::KEY_FINGERPRINT, fingerprint);
        }
        if let Some(material) = result.key_material() {
            state = state.with_attribute(attr::KEY_MATERIAL, material);
        }

        log::info!("Created key pair {} ({})", key_name, key_pair_id);
        Ok(state)
    }

    pub(crate) async fn delete_key_pair(&self, key_pair_id: &str) -> ProviderResult<()> {
        self.ec2_client
            .delete_key_pair()
            .key_pair_id(key_pair_id)
            .send()
            .await
            .map_err(|e| sdk_error("delete key pair", ResourceKind::KeyPair, e))?;
        log::info!("Deleted key pair {}", key_pair_id);
        Ok(())
    }

    // ========== EC2 Instance Operations ==========

    pub(crate) async fn describe_instances(
        &self,
        filters: &Filters,
        next_token: Option<String>,
    ) -> ProviderResult<Page<State>> {
        let kind = ResourceKind::Instance;
        let result = self
            .ec2_client
            .describe_instances()
            .set_filters(request_filters(kind, filters))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("describe instances", kind, e))?;

        let items = result
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .filter_map(instance_state)
            .collect();
        Ok(page_of(items, result.next_token()))
    }

    /// Launch one instance with a public address in the given subnet
    pub(crate) async fn run_instance(
        &self,
        spec: &InstanceSpec,
        tags: &Tags,
    ) -> ProviderResult<State> {
        let kind = ResourceKind::Instance;
        let user_data = spec.user_data.as_ref().map(|script| {
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, script.as_bytes())
        });
        let interface = InstanceNetworkInterfaceSpecification::builder()
            .device_index(0)
            .subnet_id(&spec.subnet_id)
            .associate_public_ip_address(true)
            .set_groups(Some(spec.security_group_ids.clone()))
            .build();

        let result = self
            .ec2_client
            .run_instances()
            .image_id(&spec.image_id)
            .instance_type(InstanceType::from(spec.instance_type.as_str()))
            .key_name(&spec.key_name)
            .min_count(1)
            .max_count(1)
            .network_interfaces(interface)
            .set_user_data(user_data)
            .tag_specifications(tag_specification(ResourceType::Instance, tags))
            .send()
            .await
            .map_err(|e| sdk_error("run instance", kind, e))?;

        let state = result
            .instances()
            .first()
            .and_then(instance_state)
            .ok_or_else(|| missing_field(kind, "instance ID"))?
            .with_tags(tags.clone());

        log::info!(
            "Launched instance {} ({}) in {}",
            state.identifier,
            spec.instance_type,
            spec.subnet_id
        );
        Ok(state)
    }

    pub(crate) async fn terminate_instance(&self, instance_id: &str) -> ProviderResult<()> {
        self.ec2_client
            .terminate_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| sdk_error("terminate instance", ResourceKind::Instance, e))?;
        log::info!("Terminated instance {}", instance_id);
        Ok(())
    }

    // ========== EC2 Catalog Operations ==========

    /// Images owned by the calling account
    pub(crate) async fn describe_images(
        &self,
        filters: &Filters,
        next_token: Option<String>,
    ) -> ProviderResult<Page<State>> {
        let kind = ResourceKind::Image;
        let result = self
            .ec2_client
            .describe_images()
            .owners("self")
            .set_filters(request_filters(kind, filters))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("describe images", kind, e))?;

        let items = result.images().iter().filter_map(image_state).collect();
        Ok(page_of(items, result.next_token()))
    }

    pub(crate) async fn describe_instance_types(
        &self,
        next_token: Option<String>,
    ) -> ProviderResult<Page<State>> {
        let kind = ResourceKind::InstanceType;
        let result = self
            .ec2_client
            .describe_instance_types()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("describe instance types", kind, e))?;

        let items = result
            .instance_types()
            .iter()
            .filter_map(instance_type_state)
            .collect();
        Ok(page_of(items, result.next_token()))
    }
}

// ========== Response conversion ==========

fn key_pair_state(key: &KeyPairInfo) -> Option<State> {
    let key_pair_id = key.key_pair_id()?;
    let mut state = State::new(ResourceKind::KeyPair, key_pair_id)
        .with_attribute(attr::KEY_PAIR_ID, key_pair_id)
        .with_tags(from_ec2_tags(key.tags()));
    if let Some(name) = key.key_name() {
        state = state.with_attribute(attr::KEY_NAME, name);
    }
    if let Some(fingerprint) = key.key_fingerprint() {
        state = state.with_attribute(attr::KEY_FINGERPRINT, fingerprint);
    }
    Some(state)
}

/// Terminated instances linger in describe results for a while; they are
/// treated as gone.
fn instance_state(instance: &Instance) -> Option<State> {
    let status = instance.state().and_then(|s| s.name());
    if status == Some(&InstanceStateName::Terminated) {
        return None;
    }

    let group_ids: Vec<&str> = instance
        .security_groups()
        .iter()
        .filter_map(|g| g.group_id())
        .collect();
    let mut state = State::new(ResourceKind::Instance, instance.instance_id()?)
        .with_attribute(attr::SECURITY_GROUP_IDS, group_ids.join(","))
        .with_tags(from_ec2_tags(instance.tags()));

    let optional = [
        (attr::IMAGE_ID, instance.image_id()),
        (attr::INSTANCE_TYPE, instance.instance_type().map(|t| t.as_str())),
        (attr::KEY_NAME, instance.key_name()),
        (attr::SUBNET_ID, instance.subnet_id()),
        (attr::VPC_ID, instance.vpc_id()),
        (attr::STATE, status.map(|s| s.as_str())),
        (attr::PRIVATE_IP, instance.private_ip_address()),
        (attr::PUBLIC_IP, instance.public_ip_address()),
    ];
    for (key, value) in optional.into_iter().filter_map(|(k, v)| Some((k, v?))) {
        state = state.with_attribute(key, value);
    }
    Some(state)
}

fn image_state(image: &Image) -> Option<State> {
    let mut state = State::new(ResourceKind::Image, image.image_id()?)
        .with_attribute(attr::IMAGE_ID, image.image_id()?)
        .with_tags(from_ec2_tags(image.tags()));
    if let Some(name) = image.name() {
        state = state.with_attribute(attr::IMAGE_NAME, name);
    }
    if let Some(s) = image.state() {
        state = state.with_attribute(attr::STATE, s.as_str());
    }
    Some(state)
}

fn instance_type_state(info: &InstanceTypeInfo) -> Option<State> {
    let mut state = State::new(ResourceKind::InstanceType, info.instance_type()?.as_str());
    if let Some(vcpus) = info.v_cpu_info().and_then(|v| v.default_v_cpus()) {
        state = state.with_attribute(attr::VCPUS, vcpus.to_string());
    }
    if let Some(memory) = info.memory_info().and_then(|m| m.size_in_mib()) {
        state = state.with_attribute(attr::MEMORY_MIB, memory.to_string());
    }
    Some(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{GroupIdentifier, InstanceState, MemoryInfo, VCpuInfo};

    #[test]
    fn instance_state_reads_addresses_and_groups() {
        let instance = Instance::builder()
            .instance_id("i-1")
            .image_id("ami-1")
            .instance_type(InstanceType::T3Micro)
            .key_name("deploy")
            .subnet_id("subnet-1")
            .private_ip_address("10.0.1.4")
            .public_ip_address("203.0.113.10")
            .security_groups(GroupIdentifier::builder().group_id("sg-1").build())
            .security_groups(GroupIdentifier::builder().group_id("sg-2").build())
            .state(InstanceState::builder().name(InstanceStateName::Running).build())
            .build();
        let state = instance_state(&instance).unwrap();
        assert_eq!(state.attribute(attr::INSTANCE_TYPE), Some("t3.micro"));
        assert_eq!(state.attribute(attr::SECURITY_GROUP_IDS), Some("sg-1,sg-2"));
        assert_eq!(state.attribute(attr::PUBLIC_IP), Some("203.0.113.10"));
        assert_eq!(state.attribute(attr::STATE), Some("running"));
    }

    #[test]
    fn terminated_instances_are_dropped() {
        let instance = Instance::builder()
            .instance_id("i-2")
            .state(InstanceState::builder().name(InstanceStateName::Terminated).build())
            .build();
        assert!(instance_state(&instance).is_none());
    }

    #[test]
    fn key_pair_state_never_has_material() {
        let key = KeyPairInfo::builder()
            .key_pair_id("key-1")
            .key_name("deploy")
            .key_fingerprint("aa:bb")
            .build();
        let state = key_pair_state(&key).unwrap();
        assert_eq!(state.identifier, "key-1");
        assert_eq!(state.display_name(), Some("deploy"));
        assert_eq!(state.attribute(attr::KEY_MATERIAL), None);
    }

    #[test]
    fn instance_type_state_reads_capacity() {
        let info = InstanceTypeInfo::builder()
            .instance_type(InstanceType::M5Large)
            .v_cpu_info(VCpuInfo::builder().default_v_cpus(2).build())
            .memory_info(MemoryInfo::builder().size_in_mib(8192).build())
            .build();
        let state = instance_type_state(&info).unwrap();
        assert_eq!(state.identifier, "m5.large");
        assert_eq!(state.attribute(attr::VCPUS), Some("2"));
        assert_eq!(state.attribute(attr::MEMORY_MIB), Some("8192"));
    }
}
