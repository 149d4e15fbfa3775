//! Subcommand implementations
//!
//! Every command takes the provider explicitly and returns `Result<(), String>`;
//! `main` prints the error and sets the exit code.

pub mod compute;
pub mod network;
pub mod security_group;
pub mod vpc;

use colored::Colorize;

use vpcwright_core::filter::{Filters, NamePattern};
use vpcwright_core::paginate::list;
use vpcwright_core::provider::Provider;
use vpcwright_core::provision::{self, Provisioned};
use vpcwright_core::resource::{Resource, ResourceKind, State};

use crate::output;

/// `ensure` and print the outcome
async fn ensure_and_print(provider: &dyn Provider, resource: &Resource) -> Result<State, String> {
    let provisioned = provision::ensure(provider, resource)
        .await
        .map_err(|e| e.to_string())?;
    output::print_provisioned(&provisioned);
    Ok(provisioned.into_state())
}

/// `create` without an existence check, printed as created
async fn create_and_print(provider: &dyn Provider, resource: &Resource) -> Result<State, String> {
    let state = provision::create(provider, resource)
        .await
        .map_err(|e| e.to_string())?;
    output::print_provisioned(&Provisioned::Created(state.clone()));
    Ok(state)
}

async fn delete_and_print(provider: &dyn Provider, target: &State) -> Result<(), String> {
    provision::delete(provider, target)
        .await
        .map_err(|e| e.to_string())?;
    output::print_deleted(target);
    Ok(())
}

/// Resolve an operator-supplied identifier, then delete it
async fn delete_by_id(
    provider: &dyn Provider,
    kind: ResourceKind,
    identifier: &str,
) -> Result<(), String> {
    let target = provision::find_by_id(provider, kind, identifier)
        .await
        .map_err(|e| e.to_string())?;
    delete_and_print(provider, &target).await
}

/// Resolve by filters, then delete
async fn delete_matching(
    provider: &dyn Provider,
    kind: ResourceKind,
    filters: &Filters,
) -> Result<(), String> {
    let target = provision::find(provider, kind, filters)
        .await
        .map_err(|e| e.to_string())?;
    delete_and_print(provider, &target).await
}

async fn list_and_print(
    provider: &dyn Provider,
    kind: ResourceKind,
    filters: &Filters,
    name: Option<&str>,
) -> Result<(), String> {
    let pattern = name
        .map(NamePattern::new)
        .transpose()
        .map_err(|e| e.to_string())?;
    let states = list(provider, kind, filters, pattern.as_ref())
        .await
        .map_err(|e| e.to_string())?;
    output::print_list(kind, &states);
    Ok(())
}

/// Optional attribute filters from command-line options
fn optional_filters<'a>(pairs: impl IntoIterator<Item = (&'a str, Option<&'a String>)>) -> Filters {
    pairs
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .fold(Filters::new(), |filters, (name, value)| {
            filters.attribute(name, value.clone())
        })
}

fn heading(text: &str) {
    println!("{}", text.cyan().bold());
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpcwright_core::resource::attr;

    #[test]
    fn optional_filters_skip_missing_values() {
        let vpc = "vpc-1".to_string();
        let filters = optional_filters([(attr::VPC_ID, Some(&vpc)), (attr::SUBNET_ID, None)]);
        assert_eq!(filters.len(), 1);
        assert_eq!(filters.attribute_value(attr::VPC_ID), Some("vpc-1"));
    }
}
