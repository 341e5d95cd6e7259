//! Parent/child and association resolution.
//!
//! Children come from one of two places, depending on the resource family:
//!
//! - **Listed**: a secondary list call under the parent's own ID
//!   (node pools of a cluster, routes of a route table). One extra round
//!   trip per parent; the API offers no batched alternative.
//! - **Embedded**: the parent payload already carries the children
//!   (rule collections inside an Azure Firewall). No extra call is made.
//!
//! Associations are references from one resource's properties to another
//! (a subnet's route table) and never cost a call.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::client::{ArmResource, ListOperation, ResourceClient};
use crate::ids;
use crate::lister::{self, Pager, Partial};

/// Where the children of a parent come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSource {
    /// `GET {parent_id}/{collection}`.
    Listed {
        collection: &'static str,
        api_version: &'static str,
    },
    /// `parent.properties[property]`; IDs missing from the payload become
    /// `{parent_id}/{collection}/{name}`.
    Embedded {
        property: &'static str,
        collection: &'static str,
    },
}

impl ChildSource {
    pub fn issues_call(&self) -> bool {
        matches!(self, ChildSource::Listed { .. })
    }
}

/// A child entity whose identity fields were present.
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub id: String,
    pub name: String,
    pub resource: ArmResource,
}

/// A reference from an owner's properties to another resource that is
/// imported as a separate association resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociationSpec {
    /// Property holding `{ "id": ... }` of the peer.
    pub property: &'static str,
    pub association_type: &'static str,
    /// Attribute key receiving the owner's ID.
    pub owner_key: &'static str,
    /// Attribute key receiving the peer's ID.
    pub peer_key: &'static str,
}

/// Resolve the children of one parent.
///
/// `parent_id` must already be normalized; listed children are requested
/// under it, which keeps them in the parent's own resource group.
pub async fn resolve_children(
    client: &dyn ResourceClient,
    parent_id: &str,
    parent: &ArmResource,
    source: &ChildSource,
    cancel: &CancellationToken,
) -> Partial<Vec<Child>> {
    match *source {
        ChildSource::Listed {
            collection,
            api_version,
        } => {
            let operation = ListOperation::children(parent_id, collection, api_version);
            lister::collect(Pager::<ArmResource>::new(client, operation, cancel))
                .await
                .map(|resources| identified(resources, parent_id))
        }
        ChildSource::Embedded {
            property,
            collection,
        } => Partial::complete(embedded_children(parent_id, parent, property, collection)),
    }
}

/// Keep entities that have both an ID and a name, warning about the rest.
pub fn identified(resources: Vec<ArmResource>, context: &str) -> Vec<Child> {
    resources
        .into_iter()
        .filter_map(|resource| {
            let Some((id, name)) = resource
                .identity()
                .map(|(id, name)| (id.to_string(), name.to_string()))
            else {
                warn!(
                    "Skipping entity without id or name under {} (id: {:?}, name: {:?})",
                    context, resource.id, resource.name
                );
                return None;
            };
            Some(Child { id, name, resource })
        })
        .collect()
}

fn embedded_children(
    parent_id: &str,
    parent: &ArmResource,
    property: &str,
    collection: &str,
) -> Vec<Child> {
    let Some(items) = parent.property(property).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let resource: ArmResource = match serde_json::from_value(item.clone()) {
                Ok(r) => r,
                Err(e) => {
                    warn!("Skipping malformed {} entry on {}: {}", property, parent_id, e);
                    return None;
                }
            };
            let Some(name) = resource.name.clone().filter(|n| !n.is_empty()) else {
                warn!("Skipping unnamed {} entry on {}", property, parent_id);
                return None;
            };
            let id = resource
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| ids::child_id(parent_id, collection, &name));
            Some(Child { id, name, resource })
        })
        .collect()
}

/// ID of the resource referenced by `entity.properties[property].id`.
pub fn peer_reference<'a>(entity: &'a ArmResource, property: &str) -> Option<&'a str> {
    entity
        .property(property)?
        .get("id")?
        .as_str()
        .filter(|id| !id.is_empty())
}

/// Peer IDs for every association spec whose reference is present.
pub fn resolve_associations<'a>(
    entity: &'a ArmResource,
    specs: &'a [AssociationSpec],
) -> Vec<(&'a AssociationSpec, &'a str)> {
    specs
        .iter()
        .filter_map(|spec| peer_reference(entity, spec.property).map(|peer| (spec, peer)))
        .collect()
}
