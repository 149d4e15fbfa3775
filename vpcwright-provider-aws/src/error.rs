//! Classification of EC2 error codes

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use vpcwright_core::provider::{ProviderError, ProviderErrorKind};
use vpcwright_core::resource::ResourceKind;

/// Error codes meaning the addressed resource does not exist
const NOT_FOUND_CODES: &[&str] = &[
    "InvalidVpcID.NotFound",
    "InvalidSubnetID.NotFound",
    "InvalidRouteTableID.NotFound",
    "InvalidAssociationID.NotFound",
    "InvalidInternetGatewayID.NotFound",
    "InvalidRoute.NotFound",
    "Gateway.NotAttached",
    "InvalidGroup.NotFound",
    "InvalidGroupId.NotFound",
    "InvalidPermission.NotFound",
    "InvalidSecurityGroupRuleId.NotFound",
    "InvalidKeyPair.NotFound",
    "InvalidInstanceID.NotFound",
    "InvalidAMIID.NotFound",
];

/// Error codes raised by uniqueness constraints
const ALREADY_EXISTS_CODES: &[&str] = &[
    "InvalidKeyPair.Duplicate",
    "InvalidGroup.Duplicate",
    "InvalidPermission.Duplicate",
    "RouteAlreadyExists",
    "Resource.AlreadyAssociated",
];

/// Error codes raised while the resource is still referenced
const DEPENDENCY_CODES: &[&str] = &["DependencyViolation"];

/// Error codes for rejected parameters
const INVALID_INPUT_CODES: &[&str] = &[
    "InvalidParameter",
    "InvalidParameterValue",
    "InvalidParameterCombination",
    "MissingParameter",
    "InvalidSubnet.Range",
    "InvalidSubnet.Conflict",
    "InvalidVpc.Range",
    "InvalidGroup.Reserved",
    "InvalidKeyPair.Format",
    "InvalidInstanceType",
    "OperationNotPermitted",
];

pub fn classify_code(code: Option<&str>) -> ProviderErrorKind {
    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => ProviderErrorKind::NotFound,
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => ProviderErrorKind::AlreadyExists,
        Some(c) if DEPENDENCY_CODES.contains(&c) => ProviderErrorKind::DependencyViolation,
        Some(c) if INVALID_INPUT_CODES.contains(&c) => ProviderErrorKind::InvalidInput,
        _ => ProviderErrorKind::Other,
    }
}

/// Convert an SDK error into a classified ProviderError
pub fn sdk_error<E>(action: &str, kind: ResourceKind, err: E) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let class = classify_code(ProvideErrorMetadata::code(&err));
    let message = format!("Failed to {}: {}", action, DisplayErrorContext(&err));
    ProviderError::new(message)
        .with_kind(class)
        .for_resource(kind)
        .with_cause(err)
}

/// Error for a successful response that lacks a field we rely on
pub fn missing_field(kind: ResourceKind, field: &str) -> ProviderError {
    ProviderError::new(format!("response did not include {}", field)).for_resource(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_codes() {
        assert_eq!(
            classify_code(Some("InvalidVpcID.NotFound")),
            ProviderErrorKind::NotFound
        );
        assert_eq!(
            classify_code(Some("InvalidKeyPair.Duplicate")),
            ProviderErrorKind::AlreadyExists
        );
        assert_eq!(
            classify_code(Some("DependencyViolation")),
            ProviderErrorKind::DependencyViolation
        );
        assert_eq!(
            classify_code(Some("InvalidSubnet.Conflict")),
            ProviderErrorKind::InvalidInput
        );
    }

    #[test]
    fn unknown_codes_are_other() {
        assert_eq!(classify_code(Some("UnauthorizedOperation")), ProviderErrorKind::Other);
        assert_eq!(classify_code(Some("RequestLimitExceeded")), ProviderErrorKind::Other);
        assert_eq!(classify_code(None), ProviderErrorKind::Other);
    }
}
