//! Paginated listing.
//!
//! A [`Pager`] walks one list operation page by page, following `nextLink`.
//! A [`ScopedPager`] chains one pager per target of a [`Scope`], which is the
//! only place the per-group fan-out lives. [`collect`] and [`list_in_scope`]
//! drain them into a [`Partial`]: whatever was gathered before a failure is
//! handed back alongside the error.

use std::collections::VecDeque;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{ListOperation, PageRequest, ResourceClient};
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::scope::{Scope, ScopeTarget};

/// A value together with the error that cut its production short, if any.
#[derive(Debug)]
pub struct Partial<T> {
    pub value: T,
    pub error: Option<DiscoveryError>,
}

impl<T> Partial<T> {
    pub fn complete(value: T) -> Self {
        Self { value, error: None }
    }

    pub fn failed(value: T, error: DiscoveryError) -> Self {
        Self {
            value,
            error: Some(error),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_parts(self) -> (T, Option<DiscoveryError>) {
        (self.value, self.error)
    }

    /// All-or-nothing view; drops the partial value on error.
    pub fn into_result(self) -> DiscoveryResult<T> {
        match self.error {
            None => Ok(self.value),
            Some(e) => Err(e),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Partial<U> {
        Partial {
            value: f(self.value),
            error: self.error,
        }
    }
}

/// Lazy page-by-page walk over one list operation.
///
/// A pager cannot be rewound; listing again means building a new one.
pub struct Pager<'a, T> {
    client: &'a dyn ResourceClient,
    operation: ListOperation,
    next: Option<PageRequest>,
    cancel: &'a CancellationToken,
    pages_fetched: usize,
    _item: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> Pager<'a, T> {
    pub fn new(
        client: &'a dyn ResourceClient,
        operation: ListOperation,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            client,
            next: Some(PageRequest::First(operation.clone())),
            operation,
            cancel,
            pages_fetched: 0,
            _item: PhantomData,
        }
    }

    pub fn operation(&self) -> &ListOperation {
        &self.operation
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// No further page will be requested.
    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }

    /// Fetch the next page, or `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> DiscoveryResult<Option<Vec<T>>> {
        let Some(request) = self.next.take() else {
            return Ok(None);
        };
        if self.cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled);
        }

        debug!("Fetching page {} of {}", self.pages_fetched + 1, self.operation);
        let page = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(DiscoveryError::Cancelled),
            result = self.client.fetch_page(&request, self.cancel) => {
                result.map_err(|e| DiscoveryError::provider(self.operation.path.clone(), e))?
            }
        };

        self.pages_fetched += 1;
        self.next = page
            .next_link
            .filter(|link| !link.is_empty())
            .map(PageRequest::Next);

        Ok(Some(decode_items(&self.operation, page.value)))
    }
}

fn decode_items<T: DeserializeOwned>(operation: &ListOperation, values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping undecodable item from {}: {}", operation, e);
                None
            }
        })
        .collect()
}

/// Drain a pager into a single list.
pub async fn collect<T: DeserializeOwned + Send>(mut pager: Pager<'_, T>) -> Partial<Vec<T>> {
    let mut items = Vec::new();
    loop {
        match pager.next_page().await {
            Ok(Some(page)) => items.extend(page),
            Ok(None) => return Partial::complete(items),
            Err(e) => {
                warn!(
                    "Listing {} stopped after {} page(s): {}",
                    pager.operation(),
                    pager.pages_fetched(),
                    e
                );
                return Partial::failed(items, e);
            }
        }
    }
}

/// Page-by-page walk over a list operation across every target of a scope.
///
/// A resource-group scope runs one `by_group` operation per group, in input
/// order with duplicates kept. A subscription-wide scope runs a single
/// `subscription_wide` operation. The walk stops at the first failing target.
pub struct ScopedPager<'a, T> {
    client: &'a dyn ResourceClient,
    cancel: &'a CancellationToken,
    pending: VecDeque<(ScopeTarget<'a>, ListOperation)>,
    current: Option<(ScopeTarget<'a>, Pager<'a, T>)>,
}

impl<'a, T: DeserializeOwned> ScopedPager<'a, T> {
    pub fn new<G, S>(
        client: &'a dyn ResourceClient,
        scope: &'a Scope,
        by_group: G,
        subscription_wide: S,
        cancel: &'a CancellationToken,
    ) -> Self
    where
        G: Fn(&str) -> ListOperation,
        S: FnOnce() -> ListOperation,
    {
        let pending = if scope.is_subscription_wide() {
            VecDeque::from([(ScopeTarget::Subscription, subscription_wide())])
        } else {
            scope
                .resource_groups()
                .iter()
                .map(|group| {
                    let group = group.trim();
                    (ScopeTarget::ResourceGroup(group), by_group(group))
                })
                .collect()
        };
        Self {
            client,
            cancel,
            pending,
            current: None,
        }
    }

    /// Target the next page will come from, or the one that just failed.
    pub fn target(&self) -> Option<ScopeTarget<'a>> {
        self.current
            .as_ref()
            .map(|(target, _)| *target)
            .or_else(|| self.pending.front().map(|(target, _)| *target))
    }

    /// Fetch the next page with the target it belongs to, or `None` once
    /// every target is exhausted.
    pub async fn next_page(&mut self) -> DiscoveryResult<Option<(ScopeTarget<'a>, Vec<T>)>> {
        loop {
            let Some((target, pager)) = self.current.as_mut() else {
                let Some((target, operation)) = self.pending.pop_front() else {
                    return Ok(None);
                };
                debug!("Listing {} in {}", operation, target);
                self.current = Some((target, Pager::new(self.client, operation, self.cancel)));
                continue;
            };
            let target = *target;
            match pager.next_page().await? {
                Some(items) => {
                    if pager.is_exhausted() {
                        self.current = None;
                    }
                    return Ok(Some((target, items)));
                }
                None => self.current = None,
            }
        }
    }
}

/// List across a scope and concatenate the results.
///
/// See [`ScopedPager`] for the fan-out rules.
pub async fn list_in_scope<T, G, S>(
    client: &dyn ResourceClient,
    scope: &Scope,
    by_group: G,
    subscription_wide: S,
    cancel: &CancellationToken,
) -> Partial<Vec<T>>
where
    T: DeserializeOwned + Send,
    G: Fn(&str) -> ListOperation,
    S: FnOnce() -> ListOperation,
{
    let mut pager = ScopedPager::new(client, scope, by_group, subscription_wide, cancel);
    let mut items = Vec::new();
    loop {
        match pager.next_page().await {
            Ok(Some((_, page))) => items.extend(page),
            Ok(None) => return Partial::complete(items),
            Err(e) => {
                if let Some(target) = pager.target() {
                    warn!("Listing in {} failed after {} item(s): {}", target, items.len(), e);
                }
                return Partial::failed(items, e);
            }
        }
    }
}
