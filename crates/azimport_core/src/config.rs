//! Discovery configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::families::ResourceFamily;
use crate::scope::Scope;

/// Public-cloud Resource Manager endpoint.
pub const DEFAULT_RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com";

/// What to discover and where.
///
/// ```yaml
/// subscription_id: 00000000-0000-0000-0000-000000000000
/// scope: "network-rg, aks-rg"
/// families: [aks, subnet, route_table]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub subscription_id: String,
    #[serde(default = "default_endpoint")]
    pub resource_manager_endpoint: String,
    /// Resource groups to enumerate; empty means the whole subscription.
    #[serde(default)]
    pub scope: Scope,
    /// Families to run, in output order. Empty means all of them.
    #[serde(default)]
    pub families: Vec<ResourceFamily>,
}

fn default_endpoint() -> String {
    DEFAULT_RESOURCE_MANAGER_ENDPOINT.to_string()
}

impl DiscoveryConfig {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_manager_endpoint: default_endpoint(),
            scope: Scope::subscription(),
            families: Vec::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.resource_manager_endpoint = endpoint.into();
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_families(mut self, families: impl IntoIterator<Item = ResourceFamily>) -> Self {
        self.families = families.into_iter().collect();
        self
    }

    /// Load configuration from a YAML file and validate it.
    pub fn from_file(path: &Path) -> DiscoveryResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: DiscoveryConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn save(&self, path: &Path) -> DiscoveryResult<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> DiscoveryResult<()> {
        let subscription = self.subscription_id.trim();
        if subscription.is_empty() {
            return Err(DiscoveryError::InvalidConfig(
                "subscription_id must not be empty".to_string(),
            ));
        }
        if subscription.contains('/') {
            return Err(DiscoveryError::InvalidConfig(format!(
                "subscription_id '{}' must be a bare ID, not a path",
                subscription
            )));
        }
        let endpoint = self.resource_manager_endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(DiscoveryError::InvalidConfig(format!(
                "resource_manager_endpoint '{}' must be an http(s) URL",
                endpoint
            )));
        }
        Ok(())
    }

    /// Selected families, defaulting to all, without repeats.
    pub fn selected_families(&self) -> Vec<ResourceFamily> {
        if self.families.is_empty() {
            return ResourceFamily::ALL.to_vec();
        }
        let mut selected = Vec::with_capacity(self.families.len());
        for family in &self.families {
            if !selected.contains(family) {
                selected.push(*family);
            }
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DiscoveryConfig::new("sub");
        assert_eq!(config.resource_manager_endpoint, DEFAULT_RESOURCE_MANAGER_ENDPOINT);
        assert!(config.scope.is_subscription_wide());
        assert_eq!(config.selected_families().len(), ResourceFamily::ALL.len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(DiscoveryConfig::new("  ").validate().is_err());
        assert!(DiscoveryConfig::new("/subscriptions/x").validate().is_err());
        assert!(DiscoveryConfig::new("sub")
            .with_endpoint("management.azure.com")
            .validate()
            .is_err());
    }

    #[test]
    fn test_selected_families_dedup_in_order() {
        let config = DiscoveryConfig::new("sub").with_families([
            ResourceFamily::Subnet,
            ResourceFamily::Aks,
            ResourceFamily::Subnet,
        ]);
        assert_eq!(
            config.selected_families(),
            vec![ResourceFamily::Subnet, ResourceFamily::Aks]
        );
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("azimport.yaml");
        fs::write(
            &path,
            "subscription_id: sub\nscope: \"rg1, rg2\"\nfamilies: [aks, route_table]\n",
        )
        .unwrap();

        let config = DiscoveryConfig::from_file(&path).unwrap();
        assert_eq!(config.scope.resource_groups(), &["rg1", "rg2"]);
        assert_eq!(
            config.families,
            vec![ResourceFamily::Aks, ResourceFamily::RouteTable]
        );
        assert_eq!(config.resource_manager_endpoint, DEFAULT_RESOURCE_MANAGER_ENDPOINT);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("azimport.yaml");
        let config = DiscoveryConfig::new("sub").with_scope(Scope::parse("net"));
        config.save(&path).unwrap();
        assert_eq!(DiscoveryConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_from_file_rejects_unknown_family() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("azimport.yaml");
        fs::write(&path, "subscription_id: sub\nfamilies: [loadbalancer]\n").unwrap();
        assert!(matches!(
            DiscoveryConfig::from_file(&path),
            Err(DiscoveryError::Yaml(_))
        ));
    }
}
