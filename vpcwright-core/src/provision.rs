//! Provision - Existence-gated create
//!
//! `exists` queries by identity filters, `create` mutates unconditionally and
//! `ensure` chains the two. The check-then-create pair is not atomic: two
//! concurrent callers can both observe `NotFound` and both create.

use crate::error::{ProvisionError, ProvisionResult};
use crate::filter::Filters;
use crate::paginate::describe_all;
use crate::provider::Provider;
use crate::resource::{Resource, ResourceKind, State, attr};

/// Outcome of an existence check
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(State),
    NotFound,
}

impl Lookup {
    pub fn found(self) -> Option<State> {
        match self {
            Lookup::Found(state) => Some(state),
            Lookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Outcome of a create-if-missing
#[derive(Debug, Clone, PartialEq)]
pub enum Provisioned {
    Created(State),
    Existing(State),
}

impl Provisioned {
    pub fn state(&self) -> &State {
        match self {
            Provisioned::Created(state) | Provisioned::Existing(state) => state,
        }
    }

    pub fn into_state(self) -> State {
        match self {
            Provisioned::Created(state) | Provisioned::Existing(state) => state,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.state().identifier
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Provisioned::Created(_))
    }
}

/// Look up a resource of `kind` matching every filter
///
/// Read-only. Follows pagination to exhaustion. When several resources match,
/// the first in provider order wins and a warning is logged.
pub async fn exists<P: Provider + ?Sized>(
    provider: &P,
    kind: ResourceKind,
    filters: &Filters,
) -> ProvisionResult<Lookup> {
    filters.validate()?;

    let mut matches: Vec<State> = describe_all(provider, kind, filters)
        .await?
        .into_iter()
        .filter(|state| filters.matches(state))
        .collect();

    if matches.len() > 1 {
        let ids: Vec<&str> = matches.iter().map(|s| s.identifier.as_str()).collect();
        log::warn!(
            "{} {} resources match [{}]: {}; using {}",
            matches.len(),
            kind,
            filters,
            ids.join(", "),
            ids[0]
        );
    }

    if matches.is_empty() {
        log::debug!("No {} matches [{}]", kind, filters);
        Ok(Lookup::NotFound)
    } else {
        Ok(Lookup::Found(matches.swap_remove(0)))
    }
}

/// `exists` for an upstream resource that must be present
pub async fn resolve<P: Provider + ?Sized>(
    provider: &P,
    kind: ResourceKind,
    filters: &Filters,
) -> ProvisionResult<State> {
    match exists(provider, kind, filters).await? {
        Lookup::Found(state) => Ok(state),
        Lookup::NotFound => Err(ProvisionError::dependency_missing(
            kind,
            format!("no {} matches [{}]", kind, filters),
        )),
    }
}

/// Like `resolve`, but absence is a plain `NotFound` (the resource is the target, not a dependency)
pub async fn find<P: Provider + ?Sized>(
    provider: &P,
    kind: ResourceKind,
    filters: &Filters,
) -> ProvisionResult<State> {
    match exists(provider, kind, filters).await? {
        Lookup::Found(state) => Ok(state),
        Lookup::NotFound => Err(ProvisionError::not_found(
            kind,
            format!("no {} matches [{}]", kind, filters),
        )),
    }
}

/// Resolve a resource the operator named by its identifier
pub async fn find_by_id<P: Provider + ?Sized>(
    provider: &P,
    kind: ResourceKind,
    identifier: &str,
) -> ProvisionResult<State> {
    find(provider, kind, &Filters::new().attribute(attr::ID, identifier)).await
}

/// Create `resource` unconditionally
pub async fn create<P: Provider + ?Sized>(
    provider: &P,
    resource: &Resource,
) -> ProvisionResult<State> {
    let kind = resource.kind();
    resource.spec.validate()?;
    if kind.carries_tags() {
        resource.tags.require_identity()?;
    }

    let state = provider
        .create(resource)
        .await
        .map_err(ProvisionError::from_create)?;
    log::info!("Created {} {}", kind, state.identifier);
    Ok(state)
}

/// Create `resource` unless one with the same identity already exists
pub async fn ensure<P: Provider + ?Sized>(
    provider: &P,
    resource: &Resource,
) -> ProvisionResult<Provisioned> {
    let kind = resource.kind();
    resource.spec.validate()?;
    if kind.gates_on_tags() {
        resource.tags.require_identity()?;
    }

    let filters = resource.identity_filters();
    if !filters.is_empty() {
        if let Lookup::Found(state) = exists(provider, kind, &filters).await? {
            log::info!("{} {} already exists", kind, state.identifier);
            return Ok(Provisioned::Existing(state));
        }
    }

    create(provider, resource).await.map(Provisioned::Created)
}

/// Delete a previously resolved resource
pub async fn delete<P: Provider + ?Sized>(provider: &P, target: &State) -> ProvisionResult<()> {
    if target.kind.is_read_only() {
        return Err(ProvisionError::invalid(format!(
            "{} resources cannot be deleted",
            target.kind
        )));
    }
    if target.is_main_association() {
        return Err(ProvisionError::invalid(format!(
            "{} is the main route table association and cannot be removed",
            target.identifier
        )));
    }

    provider
        .delete(target)
        .await
        .map_err(|e| ProvisionError::from_delete(target.kind, e))?;
    log::info!("Deleted {} {}", target.kind, target.identifier);
    Ok(())
}
