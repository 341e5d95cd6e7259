//! Resource family definitions.
//!
//! A family is a static table: which provider types to list, which Terraform
//! resource type each becomes, where children come from and which references
//! turn into association resources. The generic [`crate::Generator`] walks
//! these tables; adding a family means adding data, not code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DiscoveryError;
use crate::resolver::{AssociationSpec, ChildSource};

/// Category of resources handled by one generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceFamily {
    Aks,
    Firewall,
    VirtualNetwork,
    Subnet,
    RouteTable,
    NetworkSecurityGroup,
    PrivateEndpoint,
    Databricks,
}

impl ResourceFamily {
    pub const ALL: [ResourceFamily; 8] = [
        ResourceFamily::Aks,
        ResourceFamily::Firewall,
        ResourceFamily::VirtualNetwork,
        ResourceFamily::Subnet,
        ResourceFamily::RouteTable,
        ResourceFamily::NetworkSecurityGroup,
        ResourceFamily::PrivateEndpoint,
        ResourceFamily::Databricks,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResourceFamily::Aks => "aks",
            ResourceFamily::Firewall => "firewall",
            ResourceFamily::VirtualNetwork => "virtual_network",
            ResourceFamily::Subnet => "subnet",
            ResourceFamily::RouteTable => "route_table",
            ResourceFamily::NetworkSecurityGroup => "network_security_group",
            ResourceFamily::PrivateEndpoint => "private_endpoint",
            ResourceFamily::Databricks => "databricks",
        }
    }

    pub fn definition(&self) -> &'static FamilyDefinition {
        match self {
            ResourceFamily::Aks => &AKS,
            ResourceFamily::Firewall => &FIREWALL,
            ResourceFamily::VirtualNetwork => &VIRTUAL_NETWORK,
            ResourceFamily::Subnet => &SUBNET,
            ResourceFamily::RouteTable => &ROUTE_TABLE,
            ResourceFamily::NetworkSecurityGroup => &NETWORK_SECURITY_GROUP,
            ResourceFamily::PrivateEndpoint => &PRIVATE_ENDPOINT,
            ResourceFamily::Databricks => &DATABRICKS,
        }
    }
}

impl fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ResourceFamily {
    type Err = DiscoveryError;

    /// Accepts the snake_case name, with `-` allowed in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ResourceFamily::ALL
            .into_iter()
            .find(|family| family.name() == wanted)
            .ok_or_else(|| {
                DiscoveryError::InvalidConfig(format!(
                    "unknown resource family '{}' (expected one of: {})",
                    s,
                    ResourceFamily::ALL
                        .iter()
                        .map(|f| f.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Everything a generator needs to know about one family.
#[derive(Debug)]
pub struct FamilyDefinition {
    pub family: ResourceFamily,
    /// Listed in order; each kind covers every scope target before the next.
    pub primaries: &'static [PrimaryKind],
}

impl FamilyDefinition {
    /// Terraform resource types this family can produce.
    pub fn resource_types(&self) -> Vec<&'static str> {
        let mut types = Vec::new();
        for primary in self.primaries {
            if primary.emit {
                types.push(primary.type_tag);
            }
            types.extend(primary.associations.iter().map(|a| a.association_type));
            for child in primary.children {
                types.push(child.type_tag);
                types.extend(child.associations.iter().map(|a| a.association_type));
            }
        }
        types
    }
}

/// A top-level provider type listed per scope target.
#[derive(Debug)]
pub struct PrimaryKind {
    /// `{namespace}/{type}`, e.g. `Microsoft.Network/routeTables`.
    pub provider_type: &'static str,
    pub api_version: &'static str,
    pub type_tag: &'static str,
    /// `false` when the primary only anchors children (subnets under
    /// virtual networks) and is imported by another family.
    pub emit: bool,
    pub ignored_attributes: &'static [&'static str],
    pub associations: &'static [AssociationSpec],
    pub children: &'static [ChildKind],
}

/// A child collection of a primary.
#[derive(Debug)]
pub struct ChildKind {
    pub source: ChildSource,
    pub type_tag: &'static str,
    pub ignored_attributes: &'static [&'static str],
    pub associations: &'static [AssociationSpec],
}

const NETWORK_API: &str = "2021-02-01";
const ROUTING_API: &str = "2020-03-01";
const FIREWALL_API: &str = "2021-08-01";

static AKS: FamilyDefinition = FamilyDefinition {
    family: ResourceFamily::Aks,
    primaries: &[PrimaryKind {
        provider_type: "Microsoft.ContainerService/managedClusters",
        api_version: "2021-03-01",
        type_tag: "azurerm_kubernetes_cluster",
        emit: true,
        ignored_attributes: &[],
        associations: &[],
        children: &[ChildKind {
            source: ChildSource::Listed {
                collection: "agentPools",
                api_version: "2021-03-01",
            },
            type_tag: "azurerm_kubernetes_cluster_node_pool",
            ignored_attributes: &[],
            associations: &[],
        }],
    }],
};

static FIREWALL: FamilyDefinition = FamilyDefinition {
    family: ResourceFamily::Firewall,
    primaries: &[
        PrimaryKind {
            provider_type: "Microsoft.Network/azureFirewalls",
            api_version: FIREWALL_API,
            type_tag: "azurerm_firewall",
            emit: true,
            ignored_attributes: &[],
            associations: &[],
            children: &[
                ChildKind {
                    source: ChildSource::Embedded {
                        property: "networkRuleCollections",
                        collection: "networkRuleCollections",
                    },
                    type_tag: "azurerm_firewall_network_rule_collection",
                    ignored_attributes: &[],
                    associations: &[],
                },
                ChildKind {
                    source: ChildSource::Embedded {
                        property: "natRuleCollections",
                        collection: "natRuleCollections",
                    },
                    type_tag: "azurerm_firewall_nat_rule_collection",
                    ignored_attributes: &[],
                    associations: &[],
                },
                ChildKind {
                    source: ChildSource::Embedded {
                        property: "applicationRuleCollections",
                        collection: "applicationRuleCollections",
                    },
                    type_tag: "azurerm_firewall_application_rule_collection",
                    ignored_attributes: &[],
                    associations: &[],
                },
            ],
        },
        PrimaryKind {
            provider_type: "Microsoft.Network/firewallPolicies",
            api_version: FIREWALL_API,
            type_tag: "azurerm_firewall_policy",
            emit: true,
            ignored_attributes: &[],
            associations: &[],
            children: &[ChildKind {
                source: ChildSource::Listed {
                    collection: "ruleCollectionGroups",
                    api_version: FIREWALL_API,
                },
                type_tag: "azurerm_firewall_policy_rule_collection_group",
                ignored_attributes: &[],
                associations: &[],
            }],
        },
    ],
};

static VIRTUAL_NETWORK: FamilyDefinition = FamilyDefinition {
    family: ResourceFamily::VirtualNetwork,
    primaries: &[PrimaryKind {
        provider_type: "Microsoft.Network/virtualNetworks",
        api_version: NETWORK_API,
        type_tag: "azurerm_virtual_network",
        emit: true,
        // subnets are imported as standalone azurerm_subnet resources
        ignored_attributes: &["subnet"],
        associations: &[],
        children: &[ChildKind {
            source: ChildSource::Listed {
                collection: "virtualNetworkPeerings",
                api_version: NETWORK_API,
            },
            type_tag: "azurerm_virtual_network_peering",
            ignored_attributes: &[],
            associations: &[],
        }],
    }],
};

static SUBNET: FamilyDefinition = FamilyDefinition {
    family: ResourceFamily::Subnet,
    primaries: &[
        PrimaryKind {
            provider_type: "Microsoft.Network/virtualNetworks",
            api_version: NETWORK_API,
            type_tag: "azurerm_virtual_network",
            emit: false,
            ignored_attributes: &[],
            associations: &[],
            children: &[ChildKind {
                source: ChildSource::Listed {
                    collection: "subnets",
                    api_version: NETWORK_API,
                },
                type_tag: "azurerm_subnet",
                ignored_attributes: &["address_prefix"],
                associations: &[
                    AssociationSpec {
                        property: "routeTable",
                        association_type: "azurerm_subnet_route_table_association",
                        owner_key: "subnet_id",
                        peer_key: "route_table_id",
                    },
                    AssociationSpec {
                        property: "networkSecurityGroup",
                        association_type: "azurerm_subnet_network_security_group_association",
                        owner_key: "subnet_id",
                        peer_key: "network_security_group_id",
                    },
                    AssociationSpec {
                        property: "natGateway",
                        association_type: "azurerm_subnet_nat_gateway_association",
                        owner_key: "subnet_id",
                        peer_key: "nat_gateway_id",
                    },
                ],
            }],
        },
        PrimaryKind {
            provider_type: "Microsoft.Network/serviceEndpointPolicies",
            api_version: NETWORK_API,
            type_tag: "azurerm_subnet_service_endpoint_storage_policy",
            emit: true,
            ignored_attributes: &[],
            associations: &[],
            children: &[],
        },
    ],
};

static ROUTE_TABLE: FamilyDefinition = FamilyDefinition {
    family: ResourceFamily::RouteTable,
    primaries: &[
        PrimaryKind {
            provider_type: "Microsoft.Network/routeTables",
            api_version: ROUTING_API,
            type_tag: "azurerm_route_table",
            emit: true,
            ignored_attributes: &[],
            associations: &[],
            children: &[ChildKind {
                source: ChildSource::Listed {
                    collection: "routes",
                    api_version: ROUTING_API,
                },
                type_tag: "azurerm_route",
                ignored_attributes: &[],
                associations: &[],
            }],
        },
        PrimaryKind {
            provider_type: "Microsoft.Network/routeFilters",
            api_version: ROUTING_API,
            type_tag: "azurerm_route_filter",
            emit: true,
            ignored_attributes: &[],
            associations: &[],
            children: &[],
        },
    ],
};

static NETWORK_SECURITY_GROUP: FamilyDefinition = FamilyDefinition {
    family: ResourceFamily::NetworkSecurityGroup,
    primaries: &[PrimaryKind {
        provider_type: "Microsoft.Network/networkSecurityGroups",
        api_version: ROUTING_API,
        type_tag: "azurerm_network_security_group",
        emit: true,
        ignored_attributes: &[],
        associations: &[],
        children: &[ChildKind {
            source: ChildSource::Listed {
                collection: "securityRules",
                api_version: ROUTING_API,
            },
            type_tag: "azurerm_network_security_rule",
            ignored_attributes: &[],
            associations: &[],
        }],
    }],
};

static PRIVATE_ENDPOINT: FamilyDefinition = FamilyDefinition {
    family: ResourceFamily::PrivateEndpoint,
    primaries: &[
        PrimaryKind {
            provider_type: "Microsoft.Network/privateLinkServices",
            api_version: NETWORK_API,
            type_tag: "azurerm_private_link_service",
            emit: true,
            ignored_attributes: &[],
            associations: &[],
            children: &[],
        },
        PrimaryKind {
            provider_type: "Microsoft.Network/privateEndpoints",
            api_version: NETWORK_API,
            type_tag: "azurerm_private_endpoint",
            emit: true,
            ignored_attributes: &[],
            associations: &[],
            children: &[],
        },
    ],
};

static DATABRICKS: FamilyDefinition = FamilyDefinition {
    family: ResourceFamily::Databricks,
    primaries: &[PrimaryKind {
        provider_type: "Microsoft.Databricks/workspaces",
        api_version: "2018-04-01",
        type_tag: "azurerm_databricks_workspace",
        emit: true,
        ignored_attributes: &[],
        associations: &[],
        children: &[],
    }],
};
