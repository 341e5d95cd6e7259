//! # azimport_core
//!
//! Azure resource discovery for Terraform import generation.
//!
//! This crate enumerates resources of one family at a time through a
//! [`ResourceClient`], resolves their children and associations, and turns
//! every entity into an importable [`ResourceRecord`] with a stable,
//! sanitized local name.
//!
//! ## Features
//!
//! - Resource ID parsing and `resourceGroups` case normalization
//! - `nextLink` pagination with partial results on failure
//! - Subscription-wide or per-resource-group scoping
//! - Listed and embedded child resolution, association records
//! - Eight resource families described as data
//!
//! ## Example
//!
//! ```rust,no_run
//! use azimport_core::{Generator, MockClient, ResourceFamily, Scope};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> azimport_core::DiscoveryResult<()> {
//! let client = MockClient::new();
//! let cancel = CancellationToken::new();
//!
//! let mut generator = Generator::new(ResourceFamily::RouteTable, "my-subscription");
//! generator
//!     .init_resources(&client, &Scope::parse("network-rg"), &cancel)
//!     .await?;
//!
//! for record in generator.resources() {
//!     println!("{} -> {}", record.address(), record.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod families;
pub mod generator;
pub mod ids;
pub mod lister;
pub mod mock;
pub mod record;
pub mod resolver;
pub mod scope;

pub use client::{ArmResource, ListOperation, Page, PageRequest, ResourceClient};
pub use config::{DiscoveryConfig, DEFAULT_RESOURCE_MANAGER_ENDPOINT};
pub use error::{DiscoveryError, DiscoveryResult, ProviderError, ProviderResult};
pub use families::{ChildKind, FamilyDefinition, PrimaryKind, ResourceFamily};
pub use generator::{Generator, GeneratorState};
pub use ids::ResourceId;
pub use lister::{Pager, Partial, ScopedPager};
pub use mock::{CapturedCall, MockClient};
pub use record::{AssociationRecord, RecordBuilder, ResourceRecord, PROVIDER_AZURERM};
pub use resolver::{AssociationSpec, Child, ChildSource};
pub use scope::{Scope, ScopeTarget};
