//! The per-family discovery generator.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ArmResource, ListOperation, ResourceClient};
use crate::error::DiscoveryResult;
use crate::families::{ChildKind, PrimaryKind, ResourceFamily};
use crate::ids::ResourceId;
use crate::lister::ScopedPager;
use crate::record::{AssociationRecord, RecordBuilder, ResourceRecord};
use crate::resolver::{self, AssociationSpec};
use crate::scope::{Scope, ScopeTarget};

/// Lifecycle of a [`Generator`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorState {
    #[default]
    Idle,
    /// Subscription-wide primary listing.
    Listing,
    /// Primary listing for one resource group.
    ListingByGroup(String),
    ResolvingChildren,
    /// Finished; records may be partial if `init_resources` returned an error.
    Done,
    /// Stopped by a rejected credential or cancellation.
    Failed,
}

impl From<ScopeTarget<'_>> for GeneratorState {
    fn from(target: ScopeTarget<'_>) -> Self {
        match target {
            ScopeTarget::Subscription => GeneratorState::Listing,
            ScopeTarget::ResourceGroup(group) => GeneratorState::ListingByGroup(group.to_string()),
        }
    }
}

impl fmt::Display for GeneratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorState::Idle => write!(f, "idle"),
            GeneratorState::Listing => write!(f, "listing"),
            GeneratorState::ListingByGroup(group) => write!(f, "listing group {}", group),
            GeneratorState::ResolvingChildren => write!(f, "resolving children"),
            GeneratorState::Done => write!(f, "done"),
            GeneratorState::Failed => write!(f, "failed"),
        }
    }
}

/// Enumerates one resource family and turns it into importable records.
///
/// Primaries are processed page by page: each page's entities are recorded
/// and their children resolved before the next page is requested, so a
/// failure part-way through keeps everything built up to that point.
#[derive(Debug)]
pub struct Generator {
    family: ResourceFamily,
    subscription_id: String,
    state: GeneratorState,
    builder: RecordBuilder,
}

impl Generator {
    pub fn new(family: ResourceFamily, subscription_id: impl Into<String>) -> Self {
        Self {
            family,
            subscription_id: subscription_id.into(),
            state: GeneratorState::Idle,
            builder: RecordBuilder::new(),
        }
    }

    pub fn family(&self) -> ResourceFamily {
        self.family
    }

    pub fn state(&self) -> &GeneratorState {
        &self.state
    }

    pub fn resources(&self) -> &[ResourceRecord] {
        self.builder.records()
    }

    pub fn associations(&self) -> &[AssociationRecord] {
        self.builder.associations()
    }

    pub fn into_parts(self) -> (Vec<ResourceRecord>, Vec<AssociationRecord>) {
        self.builder.into_parts()
    }

    /// Enumerate the family across `scope`.
    ///
    /// Any earlier output is discarded first, so running twice against the
    /// same data yields the same records. On error the records built before
    /// the failure stay readable through [`Self::resources`] and
    /// [`Self::associations`].
    pub async fn init_resources(
        &mut self,
        client: &dyn ResourceClient,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> DiscoveryResult<()> {
        self.builder = RecordBuilder::new();
        self.state = GeneratorState::Idle;
        info!("Discovering {} resources (scope: {})", self.family, scope);

        for primary in self.family.definition().primaries {
            if let Err(e) = self.run_primary(client, scope, primary, cancel).await {
                let terminal = if e.is_hard() {
                    GeneratorState::Failed
                } else {
                    GeneratorState::Done
                };
                self.transition(terminal);
                warn!(
                    "{} discovery stopped with {} resource(s) and {} association(s): {}",
                    self.family,
                    self.builder.records().len(),
                    self.builder.associations().len(),
                    e
                );
                return Err(e);
            }
        }

        self.transition(GeneratorState::Done);
        info!(
            "Discovered {} {} resource(s) and {} association(s)",
            self.builder.records().len(),
            self.family,
            self.builder.associations().len()
        );
        Ok(())
    }

    /// List one primary kind across the scope, resolving children page by
    /// page. Errors come back tagged with the family and failing target.
    async fn run_primary(
        &mut self,
        client: &dyn ResourceClient,
        scope: &Scope,
        primary: &PrimaryKind,
        cancel: &CancellationToken,
    ) -> DiscoveryResult<()> {
        let family = self.family.name();
        let mut pager = ScopedPager::<ArmResource>::new(
            client,
            scope,
            |group| {
                ListOperation::resource_group(
                    &self.subscription_id,
                    group,
                    primary.provider_type,
                    primary.api_version,
                )
            },
            || {
                ListOperation::subscription(
                    &self.subscription_id,
                    primary.provider_type,
                    primary.api_version,
                )
            },
            cancel,
        );

        loop {
            if let Some(target) = pager.target() {
                self.transition(target.into());
            }
            let (target, page) = match pager.next_page().await {
                Ok(Some(next)) => next,
                Ok(None) => return Ok(()),
                Err(e) => {
                    let at = pager
                        .target()
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| scope.to_string());
                    return Err(e.in_family(family, at));
                }
            };
            self.transition(GeneratorState::ResolvingChildren);
            for entity in &page {
                self.record_primary(client, primary, entity, cancel)
                    .await
                    .map_err(|e| e.in_family(family, target.to_string()))?;
            }
        }
    }

    async fn record_primary(
        &mut self,
        client: &dyn ResourceClient,
        primary: &PrimaryKind,
        entity: &ArmResource,
        cancel: &CancellationToken,
    ) -> DiscoveryResult<()> {
        let Some((raw_id, name)) = entity.identity() else {
            warn!(
                "Skipping {} without id or name (id: {:?}, name: {:?})",
                primary.provider_type, entity.id, entity.name
            );
            return Ok(());
        };
        let parsed = match ResourceId::parse(raw_id) {
            Ok(id) => id,
            Err(e) => {
                warn!("Skipping {}: {}", primary.provider_type, e);
                return Ok(());
            }
        };
        let group = parsed.resource_group().to_string();
        let parent_id = parsed.to_string();

        if primary.emit {
            let record = self
                .builder
                .build_with(raw_id, &group, &[name], primary.type_tag, primary.ignored_attributes)
                .clone();
            self.record_associations(&record, entity, primary.associations);
        }

        for kind in primary.children {
            self.record_children(client, kind, &parent_id, &group, name, entity, cancel)
                .await?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_children(
        &mut self,
        client: &dyn ResourceClient,
        kind: &ChildKind,
        parent_id: &str,
        group: &str,
        parent_name: &str,
        parent: &ArmResource,
        cancel: &CancellationToken,
    ) -> DiscoveryResult<()> {
        let (children, error) =
            resolver::resolve_children(client, parent_id, parent, &kind.source, cancel)
                .await
                .into_parts();
        debug!(
            "Resolved {} {} child(ren) of {}",
            children.len(),
            kind.type_tag,
            parent_id
        );

        for child in &children {
            let record = self
                .builder
                .build_with(
                    &child.id,
                    group,
                    &[parent_name, child.name.as_str()],
                    kind.type_tag,
                    kind.ignored_attributes,
                )
                .clone();
            self.record_associations(&record, &child.resource, kind.associations);
        }

        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn record_associations(
        &mut self,
        owner: &ResourceRecord,
        entity: &ArmResource,
        specs: &[AssociationSpec],
    ) {
        for (spec, peer_id) in resolver::resolve_associations(entity, specs) {
            self.builder.associate(
                owner,
                peer_id,
                spec.association_type,
                &[(spec.owner_key, owner.id.as_str()), (spec.peer_key, peer_id)],
            );
        }
    }

    fn transition(&mut self, next: GeneratorState) {
        if self.state != next {
            debug!("{} generator: {} -> {}", self.family, self.state, next);
            self.state = next;
        }
    }
}
