//! Pagination - Follow provider continuation tokens to exhaustion

use std::collections::HashSet;
use std::future::Future;

use crate::error::{ProvisionError, ProvisionResult};
use crate::filter::{Filters, NamePattern};
use crate::provider::Provider;
use crate::resource::{ResourceKind, State};

/// One page of a describe response
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// A final page with no continuation
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    pub fn with_next(items: Vec<T>, next_token: impl Into<String>) -> Self {
        Self {
            items,
            next_token: Some(next_token.into()),
        }
    }
}

/// Fetch pages one after another until no continuation token is returned
///
/// An empty token ends the listing. A token seen twice aborts with
/// `PaginationStalled`.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> ProvisionResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = ProvisionResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut token = None;

    loop {
        let page = fetch(token.take()).await?;
        items.extend(page.items);

        match page.next_token {
            Some(next) if !next.is_empty() => {
                if !seen.insert(next.clone()) {
                    return Err(ProvisionError::PaginationStalled(next));
                }
                token = Some(next);
            }
            _ => break,
        }
    }

    Ok(items)
}

/// Every resource of `kind` matching `filters`, across all pages
pub async fn describe_all<P: Provider + ?Sized>(
    provider: &P,
    kind: ResourceKind,
    filters: &Filters,
) -> ProvisionResult<Vec<State>> {
    let states = collect_pages(|token| async move {
        provider
            .describe(kind, filters, token.as_deref())
            .await
            .map_err(ProvisionError::from_query)
    })
    .await?;
    log::debug!("Described {} {} resource(s)", states.len(), kind);
    Ok(states)
}

/// List resources of `kind`, optionally narrowed by a case-insensitive name glob
pub async fn list<P: Provider + ?Sized>(
    provider: &P,
    kind: ResourceKind,
    filters: &Filters,
    pattern: Option<&NamePattern>,
) -> ProvisionResult<Vec<State>> {
    filters.validate()?;
    let states = describe_all(provider, kind, filters).await?;
    Ok(states
        .into_iter()
        .filter(|state| filters.matches(state))
        .filter(|state| pattern.is_none_or(|p| p.matches_state(state)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryProvider;
    use crate::tags::Tags;

    #[tokio::test]
    async fn collects_three_pages_in_order() {
        let pages = vec![
            Page::with_next(vec![1, 2], "a"),
            Page::with_next(vec![3, 4], "b"),
            Page::last(vec![5]),
        ];
        let mut requested = Vec::new();
        let items = collect_pages(|token| {
            requested.push(token.clone());
            let index = requested.len() - 1;
            let page = pages[index].clone();
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            requested,
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[tokio::test]
    async fn repeated_token_is_stalled() {
        let result: ProvisionResult<Vec<u8>> =
            collect_pages(|_| async { Ok(Page::with_next(vec![1], "same")) }).await;
        match result {
            Err(ProvisionError::PaginationStalled(token)) => assert_eq!(token, "same"),
            other => panic!("expected stall, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_token_ends_listing() {
        let mut calls = 0;
        let items = collect_pages(|_| {
            calls += 1;
            async { Ok(Page::with_next(vec!['x'], "")) }
        })
        .await
        .unwrap();
        assert_eq!(items, vec!['x']);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn fetch_error_propagates() {
        let result: ProvisionResult<Vec<u8>> =
            collect_pages(|_| async { Err(ProvisionError::QueryFailed("boom".to_string())) })
                .await;
        assert!(matches!(result, Err(ProvisionError::QueryFailed(_))));
    }

    #[tokio::test]
    async fn describe_all_spans_provider_pages() {
        let provider = MemoryProvider::new().with_page_size(2);
        for i in 0..5 {
            provider.insert(
                State::new(ResourceKind::Network, format!("vpc-{}", i))
                    .with_attribute("cidr_block", format!("10.{}.0.0/16", i))
                    .with_tags(Tags::named(format!("net-{}", i), "Dev")),
            );
        }

        let states = describe_all(&provider, ResourceKind::Network, &Filters::new())
            .await
            .unwrap();
        let mut ids: Vec<_> = states.iter().map(|s| s.identifier.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
        assert_eq!(provider.describe_requests(), 3);
    }

    #[tokio::test]
    async fn list_applies_name_glob() {
        let provider = MemoryProvider::new();
        for name in ["Web-1", "web-2", "db-1"] {
            provider.insert(
                State::new(ResourceKind::InternetGateway, format!("igw-{}", name))
                    .with_tags(Tags::named(name, "Dev")),
            );
        }

        let pattern = NamePattern::new("WEB-*").unwrap();
        let states = list(
            &provider,
            ResourceKind::InternetGateway,
            &Filters::new(),
            Some(&pattern),
        )
        .await
        .unwrap();
        assert_eq!(states.len(), 2);
    }
}
