//! Importable resource records and the builder that names them.
//!
//! Every discovered entity becomes a [`ResourceRecord`] whose `local_name` is
//! usable as a Terraform resource label. Names are derived from the resource
//! group and the chain of display names, sanitized to `[A-Za-z0-9_]`, and
//! kept unique per resource type: when two different resources land on the
//! same name, the later one gets its sanitized raw ID appended, followed by
//! `_2`, `_3`, ... if that is taken as well.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ids;

/// Terraform provider every record belongs to.
pub const PROVIDER_AZURERM: &str = "azurerm";

/// One importable resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Normalized provider resource ID.
    pub id: String,
    /// Sanitized Terraform label.
    pub local_name: String,
    /// Terraform resource kind, e.g. `azurerm_subnet`.
    pub resource_type: String,
    pub provider: String,
    /// Attributes the serializer should drop from generated configuration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_attributes: Vec<String>,
}

impl ResourceRecord {
    /// Terraform address, `type.name`.
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.local_name)
    }
}

/// An attachment between two resources that is imported on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationRecord {
    pub owner_id: String,
    pub owner_local_name: String,
    pub peer_id: String,
    pub association_type: String,
    pub provider: String,
    pub attributes: BTreeMap<String, String>,
}

impl AssociationRecord {
    pub fn address(&self) -> String {
        format!("{}.{}", self.association_type, self.owner_local_name)
    }
}

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]").expect("static regex"))
}

/// Map every character outside `[A-Za-z0-9_]` to `_`.
///
/// A leading digit gets a `_` prefix so the result is a valid label.
pub fn sanitize(name: &str) -> String {
    let cleaned = unsafe_chars().replace_all(name, "_").into_owned();
    match cleaned.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("_{}", cleaned),
        _ => cleaned,
    }
}

/// Builds records and keeps local names unique per resource type.
///
/// The uniqueness check runs against every record this builder has produced
/// so far, so build order matters and is preserved in [`Self::records`].
#[derive(Debug, Default)]
pub struct RecordBuilder {
    records: Vec<ResourceRecord>,
    associations: Vec<AssociationRecord>,
    // (resource_type, local_name) -> id of the record that owns the name
    taken: HashMap<(String, String), String>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and append a record.
    ///
    /// `local_name = sanitize(scope_name + "_" + name_parts.join("_"))`.
    pub fn build<S: AsRef<str>>(
        &mut self,
        raw_id: &str,
        scope_name: &str,
        name_parts: &[S],
        resource_type: &str,
    ) -> &ResourceRecord {
        self.build_with(raw_id, scope_name, name_parts, resource_type, &[])
    }

    /// Like [`Self::build`], attaching attributes to ignore downstream.
    pub fn build_with<S: AsRef<str>>(
        &mut self,
        raw_id: &str,
        scope_name: &str,
        name_parts: &[S],
        resource_type: &str,
        ignored_attributes: &[&str],
    ) -> &ResourceRecord {
        let id = ids::normalize(raw_id);
        let joined = name_parts
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join("_");
        let mut local_name = sanitize(&format!("{}_{}", scope_name, joined));

        if self.taken_by_other(resource_type, &local_name, &id) {
            // sanitize is lossy, so the ID suffix can collide as well
            let renamed = format!("{}_{}", local_name, sanitize(raw_id));
            let mut candidate = renamed.clone();
            let mut counter = 2u32;
            while self.taken_by_other(resource_type, &candidate, &id) {
                candidate = format!("{}_{}", renamed, counter);
                counter += 1;
            }
            debug!(
                "Local name {} already used for {}, renaming to {}",
                local_name, resource_type, candidate
            );
            local_name = candidate;
        }
        self.taken
            .entry((resource_type.to_string(), local_name.clone()))
            .or_insert_with(|| id.clone());

        self.records.push(ResourceRecord {
            id,
            local_name,
            resource_type: resource_type.to_string(),
            provider: PROVIDER_AZURERM.to_string(),
            ignored_attributes: ignored_attributes.iter().map(|a| a.to_string()).collect(),
        });
        // just pushed
        &self.records[self.records.len() - 1]
    }

    /// Record an association owned by `owner`.
    ///
    /// `attributes` maps attribute keys to raw IDs; the values are normalized.
    pub fn associate(
        &mut self,
        owner: &ResourceRecord,
        peer_id: &str,
        association_type: &str,
        attributes: &[(&str, &str)],
    ) -> &AssociationRecord {
        self.associations.push(AssociationRecord {
            owner_id: owner.id.clone(),
            owner_local_name: owner.local_name.clone(),
            peer_id: ids::normalize(peer_id),
            association_type: association_type.to_string(),
            provider: PROVIDER_AZURERM.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), ids::normalize(v)))
                .collect(),
        });
        &self.associations[self.associations.len() - 1]
    }

    pub fn records(&self) -> &[ResourceRecord] {
        &self.records
    }

    fn taken_by_other(&self, resource_type: &str, local_name: &str, id: &str) -> bool {
        matches!(
            self.taken.get(&(resource_type.to_string(), local_name.to_string())),
            Some(owner) if owner != id
        )
    }

    pub fn associations(&self) -> &[AssociationRecord] {
        &self.associations
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.associations.is_empty()
    }

    pub fn into_parts(self) -> (Vec<ResourceRecord>, Vec<AssociationRecord>) {
        (self.records, self.associations)
    }
}
