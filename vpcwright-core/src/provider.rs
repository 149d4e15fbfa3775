//! Provider - Trait abstracting the cloud control plane
//!
//! A Provider answers describe/create/delete requests for each resource kind.
//! It is the only component that talks to the outside world; everything
//! else in this crate is expressed against this trait.

use std::future::Future;
use std::pin::Pin;

use crate::filter::Filters;
use crate::paginate::Page;
use crate::resource::{Resource, ResourceKind, State};

/// Classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The addressed resource does not exist
    NotFound,
    /// A uniqueness constraint rejected the request
    AlreadyExists,
    /// The resource is still referenced by another resource
    DependencyViolation,
    /// A parameter was rejected (bad CIDR, unknown protocol, range conflict)
    InvalidInput,
    /// Anything else: transport, authorization, quota
    Other,
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub resource: Option<ResourceKind>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(kind) = self.resource {
            write!(f, "[{}] {}", kind, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Other,
            message: message.into(),
            resource: None,
            cause: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ProviderErrorKind::NotFound)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ProviderErrorKind::AlreadyExists)
    }

    pub fn dependency_violation(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ProviderErrorKind::DependencyViolation)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ProviderErrorKind::InvalidInput)
    }

    pub fn with_kind(mut self, kind: ProviderErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn for_resource(mut self, kind: ResourceKind) -> Self {
        self.resource = Some(kind);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Main Provider trait
///
/// All operations are single request/response round trips. Callers issue
/// them one at a time; nothing here retries.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "aws")
    fn name(&self) -> &'static str;

    /// Resource kinds this Provider can handle
    fn supported_kinds(&self) -> Vec<ResourceKind>;

    /// Fetch one page of resources of `kind` matching every filter
    ///
    /// `next_token` is the continuation token returned with the previous
    /// page, or `None` for the first page.
    fn describe(
        &self,
        kind: ResourceKind,
        filters: &Filters,
        next_token: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<Page<State>>>;

    /// Create a resource unconditionally
    ///
    /// Returns the observed state with the provider-assigned identifier.
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete (or detach/disassociate) a previously described resource
    fn delete(&self, target: &State) -> BoxFuture<'_, ProviderResult<()>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn supported_kinds(&self) -> Vec<ResourceKind> {
        (**self).supported_kinds()
    }

    fn describe(
        &self,
        kind: ResourceKind,
        filters: &Filters,
        next_token: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<Page<State>>> {
        (**self).describe(kind, filters, next_token)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn delete(&self, target: &State) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceSpec;

    // Mock Provider for testing
    struct MockProvider;

    impl Provider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn supported_kinds(&self) -> Vec<ResourceKind> {
            vec![ResourceKind::Network]
        }

        fn describe(
            &self,
            _kind: ResourceKind,
            _filters: &Filters,
            _next_token: Option<&str>,
        ) -> BoxFuture<'_, ProviderResult<Page<State>>> {
            Box::pin(async { Ok(Page::last(vec![])) })
        }

        fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let state = State::new(resource.kind(), "mock-id-123")
                .with_attributes(resource.spec.attributes())
                .with_tags(resource.tags.clone());
            Box::pin(async move { Ok(state) })
        }

        fn delete(&self, _target: &State) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn boxed_provider_dispatches() {
        let provider: Box<dyn Provider> = Box::new(MockProvider);
        assert_eq!(provider.name(), "mock");

        let page = provider
            .describe(ResourceKind::Network, &Filters::new(), None)
            .await
            .unwrap();
        assert!(page.items.is_empty());

        let resource = Resource::new(ResourceSpec::Network {
            cidr_block: "10.0.0.0/16".to_string(),
            enable_dns: false,
        });
        let state = provider.create(&resource).await.unwrap();
        assert_eq!(state.identifier, "mock-id-123");
        assert_eq!(state.attribute("cidr_block"), Some("10.0.0.0/16"));
    }

    #[test]
    fn error_display_includes_resource_kind() {
        let err = ProviderError::already_exists("duplicate group name")
            .for_resource(ResourceKind::SecurityGroup);
        assert_eq!(err.to_string(), "[security_group] duplicate group name");
        assert_eq!(err.kind, ProviderErrorKind::AlreadyExists);
    }
}
