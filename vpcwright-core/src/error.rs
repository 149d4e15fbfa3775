//! Error types for the provisioning protocol

use thiserror::Error;

use crate::provider::{ProviderError, ProviderErrorKind};
use crate::resource::ResourceKind;

/// Errors surfaced to the operator by provisioning, listing and teardown
///
/// "Resource absent" and "request failed" are always distinct variants.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The query succeeded but nothing matched where a match was required
    #[error("{kind} not found: {detail}")]
    NotFound { kind: ResourceKind, detail: String },

    /// Transport, authorization or provider-side failure during a read
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The provider refused a create (duplicate, invalid parameter, quota)
    #[error("Create rejected: {0}")]
    CreateRejected(String),

    /// The provider refused a delete for a reason other than dependencies
    #[error("Delete rejected: {0}")]
    DeleteRejected(String),

    /// A required upstream resource could not be resolved
    #[error("Missing dependency: {kind} ({detail})")]
    DependencyMissing { kind: ResourceKind, detail: String },

    /// The resource is still referenced by another resource
    #[error("Dependency violation: {0}")]
    DependencyViolation(String),

    /// Malformed user-supplied value
    #[error("Invalid input: {0}")]
    InputInvalid(String),

    /// The provider returned a continuation token it had already returned
    #[error("Pagination stalled: token '{0}' was returned twice")]
    PaginationStalled(String),
}

impl ProvisionError {
    pub fn not_found(kind: ResourceKind, detail: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            detail: detail.into(),
        }
    }

    pub fn dependency_missing(kind: ResourceKind, detail: impl Into<String>) -> Self {
        Self::DependencyMissing {
            kind,
            detail: detail.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InputInvalid(message.into())
    }

    /// Map a provider error raised by a read
    pub fn from_query(err: ProviderError) -> Self {
        Self::QueryFailed(err.to_string())
    }

    /// Map a provider error raised by a create
    pub fn from_create(err: ProviderError) -> Self {
        match err.kind {
            ProviderErrorKind::DependencyViolation => Self::DependencyViolation(err.to_string()),
            _ => Self::CreateRejected(err.to_string()),
        }
    }

    /// Map a provider error raised by a delete
    pub fn from_delete(kind: ResourceKind, err: ProviderError) -> Self {
        match err.kind {
            ProviderErrorKind::DependencyViolation => Self::DependencyViolation(err.to_string()),
            ProviderErrorKind::NotFound => Self::not_found(kind, err.message),
            _ => Self::DeleteRejected(err.to_string()),
        }
    }

    /// Returns true if this is an absent-resource outcome rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for provisioning operations
pub type ProvisionResult<T> = Result<T, ProvisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_dependency_violation_is_preserved() {
        let err = ProviderError::new("subnet still in use")
            .with_kind(ProviderErrorKind::DependencyViolation);
        let mapped = ProvisionError::from_delete(ResourceKind::Network, err);
        assert!(matches!(mapped, ProvisionError::DependencyViolation(_)));
    }

    #[test]
    fn delete_not_found_stays_distinct_from_failure() {
        let err = ProviderError::new("no such vpc").with_kind(ProviderErrorKind::NotFound);
        let mapped = ProvisionError::from_delete(ResourceKind::Network, err);
        assert!(mapped.is_not_found());

        let err = ProviderError::new("access denied");
        let mapped = ProvisionError::from_delete(ResourceKind::Network, err);
        assert!(matches!(mapped, ProvisionError::DeleteRejected(_)));
        assert!(!mapped.is_not_found());
    }

    #[test]
    fn query_errors_never_read_as_not_found() {
        let err = ProviderError::new("not found").with_kind(ProviderErrorKind::NotFound);
        let mapped = ProvisionError::from_query(err);
        assert!(matches!(mapped, ProvisionError::QueryFailed(_)));
    }
}
