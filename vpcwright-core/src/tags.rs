//! Tags - Provider-attached key/value labels
//!
//! Every resource this tool creates carries a `Name` and an `Environment`
//! tag. Existence checks filter on that pair, so matching is exact-value
//! and case-sensitive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ProvisionError, ProvisionResult};

/// Tag key holding the human-readable resource name
pub const NAME: &str = "Name";

/// Tag key holding the environment label (e.g., "Dev")
pub const ENVIRONMENT: &str = "Environment";

/// Ordered set of tags on a resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags carrying the identifying `Name` + `Environment` pair
    pub fn named(name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self::new().with(NAME, name).with(ENVIRONMENT, environment)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.get(NAME)
    }

    pub fn environment(&self) -> Option<&str> {
        self.get(ENVIRONMENT)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that both identifying tags are present and non-empty
    pub fn require_identity(&self) -> ProvisionResult<()> {
        for key in [NAME, ENVIRONMENT] {
            match self.get(key) {
                Some(value) if !value.trim().is_empty() => {}
                _ => {
                    return Err(ProvisionError::InputInvalid(format!(
                        "resource must carry a non-empty '{}' tag",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_sets_identity_pair() {
        let tags = Tags::named("web", "Dev");
        assert_eq!(tags.name(), Some("web"));
        assert_eq!(tags.environment(), Some("Dev"));
        assert!(tags.require_identity().is_ok());
    }

    #[test]
    fn missing_environment_is_rejected() {
        let tags = Tags::new().with(NAME, "web");
        let err = tags.require_identity().unwrap_err();
        assert!(matches!(err, ProvisionError::InputInvalid(_)));
        assert!(err.to_string().contains("Environment"));
    }

    #[test]
    fn blank_name_is_rejected() {
        let tags = Tags::named("  ", "Dev");
        assert!(tags.require_identity().is_err());
    }

    #[test]
    fn collects_from_pairs() {
        let tags: Tags = vec![("Name", "a"), ("Team", "net")].into_iter().collect();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.get("Team"), Some("net"));
    }
}
