//! In-memory resource client for testing.
//!
//! Serves canned pages keyed by list path, follows its own `mock://` next
//! links and captures every call so tests can assert on ordering and count
//! without a live subscription.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::client::{Page, PageRequest, ResourceClient};
use crate::error::{ProviderError, ProviderResult};

const MOCK_SCHEME: &str = "mock://";

/// Captured call information for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCall {
    pub path: String,
    /// `None` for continuation requests.
    pub api_version: Option<String>,
    /// Zero-based page index within the listing.
    pub page: usize,
}

/// Mock resource client.
#[derive(Clone, Default)]
pub struct MockClient {
    /// Pages per list path.
    pages: Arc<RwLock<HashMap<String, Vec<Vec<Value>>>>>,
    /// Failures per (path, page).
    failures: Arc<RwLock<HashMap<(String, usize), ProviderError>>>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Cancel the caller's token once this many calls were served.
    cancel_after: Arc<RwLock<Option<usize>>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `items` as a single page at `path`.
    pub fn with_list(self, path: impl Into<String>, items: Vec<Value>) -> Self {
        self.with_pages(path, vec![items])
    }

    /// Serve several pages at `path`, linked through `nextLink`.
    pub fn with_pages(self, path: impl Into<String>, pages: Vec<Vec<Value>>) -> Self {
        self.pages.write().insert(path.into(), pages);
        self
    }

    /// Fail the first page at `path`.
    pub fn fail_on(self, path: impl Into<String>, error: ProviderError) -> Self {
        self.fail_on_page(path, 0, error)
    }

    /// Fail page `page` (zero-based) at `path`.
    pub fn fail_on_page(self, path: impl Into<String>, page: usize, error: ProviderError) -> Self {
        self.failures.write().insert((path.into(), page), error);
        self
    }

    /// Cancel the token passed to `fetch_page` after `calls` calls completed.
    pub fn cancel_after(self, calls: usize) -> Self {
        *self.cancel_after.write() = Some(calls);
        self
    }

    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Paths of every first-page request, in call order.
    pub fn listed_paths(&self) -> Vec<String> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.page == 0)
            .map(|c| c.path.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    pub fn was_called(&self, path: &str) -> bool {
        self.captured_calls.read().iter().any(|c| c.path == path)
    }

    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
    }

    fn resolve(request: &PageRequest) -> ProviderResult<(String, Option<String>, usize)> {
        match request {
            PageRequest::First(op) => Ok((op.path.clone(), Some(op.api_version.clone()), 0)),
            PageRequest::Next(link) => {
                let (path, page) = link
                    .strip_prefix(MOCK_SCHEME)
                    .and_then(|rest| rest.rsplit_once('#'))
                    .and_then(|(path, page)| page.parse::<usize>().ok().map(|p| (path, p)))
                    .ok_or_else(|| ProviderError::status(404, format!("unknown next link {}", link)))?;
                Ok((path.to_string(), None, page))
            }
        }
    }
}

#[async_trait]
impl ResourceClient for MockClient {
    async fn fetch_page(
        &self,
        request: &PageRequest,
        cancel: &CancellationToken,
    ) -> ProviderResult<Page> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let (path, api_version, page) = Self::resolve(request)?;
        self.record_call(CapturedCall {
            path: path.clone(),
            api_version,
            page,
        });

        if let Some(limit) = *self.cancel_after.read() {
            if self.call_count() >= limit {
                cancel.cancel();
            }
        }

        if let Some(error) = self.failures.read().get(&(path.clone(), page)) {
            return Err(error.clone());
        }

        let pages = self.pages.read();
        let Some(listing) = pages.get(&path) else {
            return Ok(Page::default());
        };
        let value = listing.get(page).cloned().unwrap_or_default();
        let result = Page::new(value);
        if page + 1 < listing.len() {
            Ok(result.with_next_link(format!("{}{}#{}", MOCK_SCHEME, path, page + 1)))
        } else {
            Ok(result)
        }
    }
}

/// A minimal list entity.
pub fn entity(id: &str, name: &str) -> Value {
    json!({ "id": id, "name": name, "properties": {} })
}

/// A list entity carrying `properties`.
pub fn entity_with(id: &str, name: &str, properties: Value) -> Value {
    json!({ "id": id, "name": name, "properties": properties })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ListOperation;

    #[tokio::test]
    async fn test_serves_linked_pages() {
        let client = MockClient::new().with_pages(
            "/p",
            vec![vec![entity("/a", "a")], vec![entity("/b", "b")]],
        );
        let cancel = CancellationToken::new();

        let first = client
            .fetch_page(&PageRequest::First(ListOperation::new("/p", "v")), &cancel)
            .await
            .unwrap();
        let link = first.next_link.clone().unwrap();
        let second = client
            .fetch_page(&PageRequest::Next(link), &cancel)
            .await
            .unwrap();

        assert_eq!(first.value.len(), 1);
        assert!(second.next_link.is_none());
        assert_eq!(client.call_count(), 2);
        assert_eq!(client.listed_paths(), vec!["/p"]);
    }

    #[tokio::test]
    async fn test_unknown_path_is_empty() {
        let client = MockClient::new();
        let cancel = CancellationToken::new();
        let page = client
            .fetch_page(&PageRequest::First(ListOperation::new("/nothing", "v")), &cancel)
            .await
            .unwrap();
        assert!(page.value.is_empty());
        assert!(client.was_called("/nothing"));
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let client = MockClient::new().fail_on("/p", ProviderError::status(500, "boom"));
        let cancel = CancellationToken::new();
        let err = client
            .fetch_page(&PageRequest::First(ListOperation::new("/p", "v")), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::status(500, "boom"));
    }

    #[tokio::test]
    async fn test_cancel_after() {
        let client = MockClient::new().cancel_after(1);
        let cancel = CancellationToken::new();
        let request = PageRequest::First(ListOperation::new("/p", "v"));
        assert!(client.fetch_page(&request, &cancel).await.is_ok());
        assert!(cancel.is_cancelled());
        assert_eq!(
            client.fetch_page(&request, &cancel).await.unwrap_err(),
            ProviderError::Cancelled
        );
    }
}
