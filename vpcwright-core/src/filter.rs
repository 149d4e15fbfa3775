//! Filter - Tag and attribute predicates for describe requests
//!
//! Providers translate filters into their server-side query form. The same
//! filters are re-applied client-side with [`Filters::matches`], so matching
//! is always exact-value and case-sensitive regardless of provider quirks.

use std::fmt;

use glob::{MatchOptions, Pattern};

use crate::error::{ProvisionError, ProvisionResult};
use crate::resource::{State, attr};

/// A single exact-match predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Match a tag by key and value
    Tag { key: String, value: String },
    /// Match an attribute (see `resource::attr`) by value
    Attribute { name: String, value: String },
}

impl Filter {
    pub fn tag(key: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Tag {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Attribute {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Filter::Tag { value, .. } | Filter::Attribute { value, .. } => value,
        }
    }

    pub fn matches(&self, state: &State) -> bool {
        match self {
            Filter::Tag { key, value } => state.tags.get(key) == Some(value.as_str()),
            Filter::Attribute { name, value } if name == attr::ID => state.identifier == *value,
            Filter::Attribute { name, value } => state.attribute(name) == Some(value.as_str()),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Tag { key, value } => write!(f, "tag:{}={}", key, value),
            Filter::Attribute { name, value } => write!(f, "{}={}", name, value),
        }
    }
}

/// Conjunction of filters; an empty set matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(Vec<Filter>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push(Filter::tag(key, value));
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push(Filter::attribute(name, value));
        self
    }

    pub fn push(&mut self, filter: Filter) {
        self.0.push(filter);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of the first attribute filter named `name`
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.0.iter().find_map(|f| match f {
            Filter::Attribute { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Every filter must carry a non-empty value
    pub fn validate(&self) -> ProvisionResult<()> {
        match self.0.iter().find(|f| f.value().is_empty()) {
            Some(filter) => Err(ProvisionError::invalid(format!(
                "filter '{}' has an empty value",
                filter
            ))),
            None => Ok(()),
        }
    }

    pub fn matches(&self, state: &State) -> bool {
        self.0.iter().all(|f| f.matches(state))
    }
}

impl FromIterator<Filter> for Filters {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Filters {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Filters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(", "))
    }
}

/// Case-insensitive glob over resource names (`*`, `?`, `[..]`)
#[derive(Debug, Clone)]
pub struct NamePattern(Pattern);

impl NamePattern {
    pub fn new(pattern: &str) -> ProvisionResult<Self> {
        Pattern::new(pattern)
            .map(Self)
            .map_err(|e| ProvisionError::invalid(format!("invalid name pattern '{}': {}", pattern, e)))
    }

    pub fn matches(&self, name: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };
        self.0.matches_with(name, options)
    }

    /// Unnamed resources never match
    pub fn matches_state(&self, state: &State) -> bool {
        state.display_name().is_some_and(|name| self.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;
    use crate::tags::Tags;

    fn network(name: &str) -> State {
        State::new(ResourceKind::Network, "vpc-1")
            .with_attribute("cidr_block", "10.0.0.0/16")
            .with_tags(Tags::named(name, "Dev"))
    }

    #[test]
    fn tag_matching_is_case_sensitive() {
        let filters = Filters::new().tag("Name", "Foo");
        assert!(filters.matches(&network("Foo")));
        assert!(!filters.matches(&network("foo")));
    }

    #[test]
    fn all_filters_must_match() {
        let filters = Filters::new()
            .tag("Name", "Foo")
            .attribute("cidr_block", "10.1.0.0/16");
        assert!(!filters.matches(&network("Foo")));
        assert!(Filters::new().matches(&network("Foo")));
    }

    #[test]
    fn empty_value_is_invalid() {
        let filters = Filters::new().tag("Name", "Foo").tag("Environment", "");
        assert!(matches!(
            filters.validate(),
            Err(ProvisionError::InputInvalid(_))
        ));
    }

    #[test]
    fn id_filter_matches_identifier() {
        let filters = Filters::new().attribute(attr::ID, "vpc-1");
        assert!(filters.matches(&network("Foo")));
        assert!(!Filters::new().attribute(attr::ID, "vpc-2").matches(&network("Foo")));
    }

    #[test]
    fn attribute_value_lookup() {
        let filters = Filters::new().attribute("vpc_id", "vpc-9");
        assert_eq!(filters.attribute_value("vpc_id"), Some("vpc-9"));
        assert_eq!(filters.attribute_value("subnet_id"), None);
    }

    #[test]
    fn name_pattern_ignores_case() {
        let pattern = NamePattern::new("web-*").unwrap();
        assert!(pattern.matches("WEB-prod"));
        assert!(pattern.matches("web-"));
        assert!(!pattern.matches("api-web"));
        assert!(pattern.matches_state(&network("Web-1")));

        let pattern = NamePattern::new("db-?").unwrap();
        assert!(pattern.matches("DB-1"));
        assert!(!pattern.matches("db-10"));
    }

    #[test]
    fn invalid_name_pattern_is_rejected() {
        assert!(NamePattern::new("[").is_err());
    }
}
