//! Azure resource ID parsing and normalization.
//!
//! Resource Manager IDs follow the layout
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}[/{type}/{name}...]`.
//! Different API versions disagree on the casing of the `resourceGroups`
//! segment, and Terraform's import matching is case-sensitive, so every ID is
//! passed through [`normalize`] before it ends up in a record.

use std::fmt;

use crate::error::{DiscoveryError, DiscoveryResult};

const SUBSCRIPTIONS: &str = "subscriptions";
const RESOURCE_GROUPS: &str = "resourceGroups";
const PROVIDERS: &str = "providers";

/// Index of the subscription segment in a split ID.
const SUBSCRIPTION_INDEX: usize = 2;
/// Index of the resource group segment in a split ID.
const RESOURCE_GROUP_INDEX: usize = 4;

/// Parsed representation of a provider resource path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    subscription: String,
    resource_group: String,
    namespace: Option<String>,
    segments: Vec<(String, String)>,
}

impl ResourceId {
    /// Parse a raw resource ID.
    pub fn parse(raw: &str) -> DiscoveryResult<Self> {
        let parts: Vec<&str> = raw.split('/').collect();
        if parts.len() <= RESOURCE_GROUP_INDEX {
            return Err(DiscoveryError::malformed(
                raw,
                format!("expected at least 5 path segments, found {}", parts.len()),
            ));
        }
        if !parts[0].is_empty() {
            return Err(DiscoveryError::malformed(raw, "ID must start with '/'"));
        }
        if !parts[1].eq_ignore_ascii_case(SUBSCRIPTIONS) {
            return Err(DiscoveryError::malformed(raw, "expected 'subscriptions' segment"));
        }
        if !parts[3].eq_ignore_ascii_case(RESOURCE_GROUPS) {
            return Err(DiscoveryError::malformed(raw, "expected 'resourceGroups' segment"));
        }

        let subscription = parts[SUBSCRIPTION_INDEX];
        let resource_group = parts[RESOURCE_GROUP_INDEX];
        if subscription.is_empty() || resource_group.is_empty() {
            return Err(DiscoveryError::malformed(
                raw,
                "subscription and resource group must not be empty",
            ));
        }

        let rest = &parts[RESOURCE_GROUP_INDEX + 1..];
        if rest.is_empty() {
            return Ok(Self {
                subscription: subscription.to_string(),
                resource_group: resource_group.to_string(),
                namespace: None,
                segments: Vec::new(),
            });
        }

        if rest.len() < 2 || !rest[0].eq_ignore_ascii_case(PROVIDERS) || rest[1].is_empty() {
            return Err(DiscoveryError::malformed(
                raw,
                "expected 'providers/<namespace>' after the resource group",
            ));
        }

        let pairs = &rest[2..];
        if pairs.is_empty() || pairs.len() % 2 != 0 {
            return Err(DiscoveryError::malformed(
                raw,
                "expected alternating resourceType/name segments",
            ));
        }

        let mut segments = Vec::with_capacity(pairs.len() / 2);
        for pair in pairs.chunks(2) {
            if pair[0].is_empty() || pair[1].is_empty() {
                return Err(DiscoveryError::malformed(raw, "empty resourceType or name segment"));
            }
            segments.push((pair[0].to_string(), pair[1].to_string()));
        }

        Ok(Self {
            subscription: subscription.to_string(),
            resource_group: resource_group.to_string(),
            namespace: Some(rest[1].to_string()),
            segments,
        })
    }

    pub fn subscription(&self) -> &str {
        &self.subscription
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Ordered `(type, name)` pairs below the provider namespace.
    pub fn segments(&self) -> &[(String, String)] {
        &self.segments
    }

    /// Full resource type, e.g. `Microsoft.Network/virtualNetworks/subnets`.
    ///
    /// Empty for a bare resource group ID.
    pub fn resource_type(&self) -> String {
        match &self.namespace {
            Some(ns) => std::iter::once(ns.as_str())
                .chain(self.segments.iter().map(|(t, _)| t.as_str()))
                .collect::<Vec<_>>()
                .join("/"),
            None => String::new(),
        }
    }

    /// Name of the addressed resource (the resource group for a bare group ID).
    pub fn name(&self) -> &str {
        self.segments
            .last()
            .map(|(_, n)| n.as_str())
            .unwrap_or(&self.resource_group)
    }

    /// ID of the enclosing resource, if this one is nested.
    pub fn parent(&self) -> Option<ResourceId> {
        if self.segments.len() < 2 {
            return None;
        }
        let mut parent = self.clone();
        parent.segments.pop();
        Some(parent)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{}/{}/{}/{}",
            SUBSCRIPTIONS, self.subscription, RESOURCE_GROUPS, self.resource_group
        )?;
        if let Some(ns) = &self.namespace {
            write!(f, "/{}/{}", PROVIDERS, ns)?;
            for (resource_type, name) in &self.segments {
                write!(f, "/{}/{}", resource_type, name)?;
            }
        }
        Ok(())
    }
}

/// Parse a raw resource ID. See [`ResourceId::parse`].
pub fn parse(raw: &str) -> DiscoveryResult<ResourceId> {
    ResourceId::parse(raw)
}

/// Rewrite every `resourcegroups` path segment (any casing) to `resourceGroups`.
///
/// All other bytes are left untouched.
pub fn normalize(raw: &str) -> String {
    raw.split('/')
        .map(|segment| {
            if segment.eq_ignore_ascii_case(RESOURCE_GROUPS) {
                RESOURCE_GROUPS
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Import ID of a child that only exists embedded in its parent's payload.
pub fn child_id(parent_id: &str, collection: &str, name: &str) -> String {
    format!("{}/{}/{}", normalize(parent_id).trim_end_matches('/'), collection, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBNET: &str = "/subscriptions/0000/resourceGroups/net-rg/providers/Microsoft.Network/virtualNetworks/hub/subnets/default";

    #[test]
    fn test_normalize_rewrites_only_the_group_segment() {
        let raw = "/subscriptions/0000/resourcegroups/MyRG/providers/Microsoft.Network/routeTables/rt";
        assert_eq!(
            normalize(raw),
            "/subscriptions/0000/resourceGroups/MyRG/providers/Microsoft.Network/routeTables/rt"
        );

        let upper = "/subscriptions/0000/RESOURCEGROUPS/resourcegroups-rg/providers/x/y/z";
        assert_eq!(
            normalize(upper),
            "/subscriptions/0000/resourceGroups/resourcegroups-rg/providers/x/y/z"
        );
    }

    #[test]
    fn test_normalize_keeps_names_that_merely_contain_the_word() {
        let raw = "/subscriptions/0000/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/myresourcegroups";
        assert_eq!(normalize(raw), raw);
    }

    #[test]
    fn test_parse_extracts_components() {
        let id = parse(SUBNET).unwrap();
        assert_eq!(id.subscription(), "0000");
        assert_eq!(id.resource_group(), "net-rg");
        assert_eq!(id.namespace(), Some("Microsoft.Network"));
        assert_eq!(id.resource_type(), "Microsoft.Network/virtualNetworks/subnets");
        assert_eq!(id.name(), "default");
        assert_eq!(id.segments()[0], ("virtualNetworks".to_string(), "hub".to_string()));
    }

    #[test]
    fn test_parse_short_ids_fail() {
        for raw in ["", "/", "/subscriptions", "/subscriptions/0000", "/subscriptions/0000/resourceGroups"] {
            let err = parse(raw).unwrap_err();
            assert!(matches!(err, DiscoveryError::MalformedId { .. }), "{raw}");
        }
    }

    #[test]
    fn test_parse_rejects_broken_layout() {
        assert!(parse("subscriptions/0000/resourceGroups/rg/x").is_err());
        assert!(parse("/subscriptions/0000/groups/rg").is_err());
        assert!(parse("/subscriptions/0000/resourceGroups/rg/providers").is_err());
        assert!(parse("/subscriptions/0000/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks").is_err());
        assert!(parse("/subscriptions/0000/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/").is_err());
    }

    #[test]
    fn test_bare_resource_group() {
        let id = parse("/subscriptions/0000/resourcegroups/rg").unwrap();
        assert_eq!(id.name(), "rg");
        assert_eq!(id.resource_type(), "");
        assert_eq!(id.to_string(), "/subscriptions/0000/resourceGroups/rg");
    }

    #[test]
    fn test_round_trip_matches_normalized_form() {
        let raw = "/subscriptions/0000/resourcegroups/Net-RG/providers/Microsoft.ContainerService/managedClusters/aks1/agentPools/system";
        assert_eq!(parse(raw).unwrap().to_string(), normalize(raw));
    }

    #[test]
    fn test_parent() {
        let id = parse(SUBNET).unwrap();
        let parent = id.parent().unwrap();
        assert_eq!(parent.name(), "hub");
        assert!(parent.parent().is_none());
    }

    #[test]
    fn test_child_id() {
        let fw = "/subscriptions/0000/resourcegroups/rg/providers/Microsoft.Network/azureFirewalls/fw";
        assert_eq!(
            child_id(fw, "networkRuleCollections", "allow-dns"),
            "/subscriptions/0000/resourceGroups/rg/providers/Microsoft.Network/azureFirewalls/fw/networkRuleCollections/allow-dns"
        );
    }
}
