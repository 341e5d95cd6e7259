//! Upstream provider client abstraction.
//!
//! The discovery core only ever issues paged, read-only list calls. A
//! [`ResourceClient`] turns a [`PageRequest`] into one [`Page`]; transport,
//! authentication and retries live behind the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderResult;

/// A list operation against the Resource Manager API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListOperation {
    /// Path relative to the Resource Manager endpoint, starting with `/subscriptions/`.
    pub path: String,
    /// API version sent as the `api-version` query parameter.
    pub api_version: String,
}

impl ListOperation {
    pub fn new(path: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            api_version: api_version.into(),
        }
    }

    /// List every resource of `provider_type` in a subscription.
    pub fn subscription(subscription_id: &str, provider_type: &str, api_version: &str) -> Self {
        Self::new(
            format!("/subscriptions/{}/providers/{}", subscription_id, provider_type),
            api_version,
        )
    }

    /// List resources of `provider_type` in one resource group.
    pub fn resource_group(
        subscription_id: &str,
        resource_group: &str,
        provider_type: &str,
        api_version: &str,
    ) -> Self {
        Self::new(
            format!(
                "/subscriptions/{}/resourceGroups/{}/providers/{}",
                subscription_id, resource_group, provider_type
            ),
            api_version,
        )
    }

    /// List a child collection of an existing resource.
    pub fn children(parent_id: &str, collection: &str, api_version: &str) -> Self {
        Self::new(
            format!("{}/{}", parent_id.trim_end_matches('/'), collection),
            api_version,
        )
    }
}

impl std::fmt::Display for ListOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// Request for a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// First page of a list operation.
    First(ListOperation),
    /// Continuation URL returned as `nextLink` by the previous page.
    Next(String),
}

/// One page of list results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub value: Vec<Value>,
    #[serde(rename = "nextLink", default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

impl Page {
    pub fn new(value: Vec<Value>) -> Self {
        Self {
            value,
            next_link: None,
        }
    }

    pub fn with_next_link(mut self, link: impl Into<String>) -> Self {
        self.next_link = Some(link.into());
        self
    }
}

/// Generic Resource Manager entity.
///
/// Identity fields are optional because the API does not guarantee them;
/// callers skip entities without an ID or name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmResource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub properties: Value,
}

impl ArmResource {
    /// `(id, name)` when both are present and non-empty.
    pub fn identity(&self) -> Option<(&str, &str)> {
        match (self.id.as_deref(), self.name.as_deref()) {
            (Some(id), Some(name)) if !id.is_empty() && !name.is_empty() => Some((id, name)),
            _ => None,
        }
    }

    /// Look up a property by name, treating JSON `null` as absent.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key).filter(|v| !v.is_null())
    }
}

/// Read-only, paged access to the provider API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetch one page.
    ///
    /// Implementations must return [`crate::ProviderError::Cancelled`]
    /// promptly once `cancel` fires.
    async fn fetch_page(
        &self,
        request: &PageRequest,
        cancel: &CancellationToken,
    ) -> ProviderResult<Page>;
}
