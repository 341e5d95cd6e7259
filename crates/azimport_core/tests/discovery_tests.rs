//! Integration tests for family discovery.
//!
//! These tests drive the generic generator against the in-memory
//! `MockClient`, so no subscription or credentials are needed.

use serde_json::json;
use tokio_util::sync::CancellationToken;

use azimport_core::mock::{entity, entity_with};
use azimport_core::{
    ids, DiscoveryError, Generator, GeneratorState, MockClient, ProviderError, ResourceFamily,
    Scope,
};

const SUB: &str = "sub";

fn rg_list(rg: &str, provider_type: &str) -> String {
    format!("/subscriptions/{}/resourceGroups/{}/providers/{}", SUB, rg, provider_type)
}

fn sub_list(provider_type: &str) -> String {
    format!("/subscriptions/{}/providers/{}", SUB, provider_type)
}

fn resource_id(rg: &str, provider_type: &str, name: &str) -> String {
    format!("{}/{}", rg_list(rg, provider_type), name)
}

fn names(generator: &Generator) -> Vec<&str> {
    generator
        .resources()
        .iter()
        .map(|r| r.local_name.as_str())
        .collect()
}

/// rg1 holds one cluster with two node pools, rg2 holds none.
#[tokio::test]
async fn test_aks_across_two_groups() {
    let cluster = resource_id("rg1", "Microsoft.ContainerService/managedClusters", "aks-prod");
    let client = MockClient::new()
        .with_list(
            rg_list("rg1", "Microsoft.ContainerService/managedClusters"),
            vec![entity(&cluster, "aks-prod")],
        )
        .with_list(
            format!("{}/agentPools", cluster),
            vec![
                entity(&format!("{}/agentPools/system", cluster), "system"),
                entity(&format!("{}/agentPools/user", cluster), "user"),
            ],
        );

    let cancel = CancellationToken::new();
    let mut generator = Generator::new(ResourceFamily::Aks, SUB);
    generator
        .init_resources(&client, &Scope::parse("rg1, rg2"), &cancel)
        .await
        .unwrap();

    assert_eq!(generator.state(), &GeneratorState::Done);
    assert_eq!(
        names(&generator),
        vec!["rg1_aks_prod", "rg1_aks_prod_system", "rg1_aks_prod_user"]
    );
    let types: Vec<_> = generator
        .resources()
        .iter()
        .map(|r| r.resource_type.as_str())
        .collect();
    assert_eq!(
        types,
        vec![
            "azurerm_kubernetes_cluster",
            "azurerm_kubernetes_cluster_node_pool",
            "azurerm_kubernetes_cluster_node_pool",
        ]
    );
    assert!(client.was_called(&rg_list("rg2", "Microsoft.ContainerService/managedClusters")));
}

#[tokio::test]
async fn test_firewall_policy_rule_collection_groups() {
    let policy = resource_id("net", "Microsoft.Network/firewallPolicies", "base-policy");
    let client = MockClient::new()
        .with_list(
            rg_list("net", "Microsoft.Network/firewallPolicies"),
            vec![entity(&policy, "base-policy")],
        )
        .with_list(
            format!("{}/ruleCollectionGroups", policy),
            vec![entity(
                &format!("{}/ruleCollectionGroups/DefaultNetworkRuleCollectionGroup", policy),
                "DefaultNetworkRuleCollectionGroup",
            )],
        );

    let cancel = CancellationToken::new();
    let mut generator = Generator::new(ResourceFamily::Firewall, SUB);
    generator
        .init_resources(&client, &Scope::parse("net"), &cancel)
        .await
        .unwrap();

    let resources = generator.resources();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0].resource_type, "azurerm_firewall_policy");
    assert_eq!(resources[0].local_name, "net_base_policy");
    assert_eq!(
        resources[1].resource_type,
        "azurerm_firewall_policy_rule_collection_group"
    );
    assert_eq!(
        resources[1].local_name,
        "net_base_policy_DefaultNetworkRuleCollectionGroup"
    );
}

#[tokio::test]
async fn test_firewall_embedded_rule_collections() {
    let firewall = resource_id("net", "Microsoft.Network/azureFirewalls", "fw");
    let client = MockClient::new().with_list(
        sub_list("Microsoft.Network/azureFirewalls"),
        vec![entity_with(
            &firewall,
            "fw",
            json!({
                "networkRuleCollections": [{"name": "allow-dns"}],
                "natRuleCollections": [],
                "applicationRuleCollections": [{"name": "web"}]
            }),
        )],
    );

    let cancel = CancellationToken::new();
    let mut generator = Generator::new(ResourceFamily::Firewall, SUB);
    generator
        .init_resources(&client, &Scope::subscription(), &cancel)
        .await
        .unwrap();

    let resources = generator.resources();
    assert_eq!(resources.len(), 3);
    assert_eq!(resources[1].resource_type, "azurerm_firewall_network_rule_collection");
    assert_eq!(resources[1].id, format!("{}/networkRuleCollections/allow-dns", firewall));
    assert_eq!(resources[1].local_name, "net_fw_allow_dns");
    assert_eq!(resources[2].resource_type, "azurerm_firewall_application_rule_collection");

    // embedded collections cost no extra call
    assert!(!client.was_called(&format!("{}/networkRuleCollections", firewall)));
}

#[tokio::test]
async fn test_subnet_route_table_association() {
    let vnet = resource_id("net", "Microsoft.Network/virtualNetworks", "hub");
    let route_table = resource_id("net", "Microsoft.Network/routeTables", "default-rt");
    let client = MockClient::new()
        .with_list(
            rg_list("net", "Microsoft.Network/virtualNetworks"),
            vec![entity(&vnet, "hub")],
        )
        .with_list(
            format!("{}/subnets", vnet),
            vec![
                entity_with(
                    &format!("{}/subnets/app", vnet),
                    "app",
                    json!({"routeTable": {"id": route_table.replace("resourceGroups", "resourcegroups")}}),
                ),
                entity_with(&format!("{}/subnets/data", vnet), "data", json!({"routeTable": null})),
            ],
        );

    let cancel = CancellationToken::new();
    let mut generator = Generator::new(ResourceFamily::Subnet, SUB);
    generator
        .init_resources(&client, &Scope::parse("net"), &cancel)
        .await
        .unwrap();

    // virtual networks anchor the listing but are not emitted
    assert_eq!(names(&generator), vec!["net_hub_app", "net_hub_data"]);
    assert!(generator
        .resources()
        .iter()
        .all(|r| r.ignored_attributes == vec!["address_prefix".to_string()]));

    let associations = generator.associations();
    assert_eq!(associations.len(), 1);
    let association = &associations[0];
    assert_eq!(association.association_type, "azurerm_subnet_route_table_association");
    assert_eq!(association.owner_local_name, "net_hub_app");
    assert_eq!(association.peer_id, route_table);
    assert_eq!(association.attributes["subnet_id"], format!("{}/subnets/app", vnet));
    assert_eq!(association.attributes["route_table_id"], route_table);
}

#[tokio::test]
async fn test_scoped_calls_follow_input_order() {
    let client = MockClient::new();
    let cancel = CancellationToken::new();
    let mut generator = Generator::new(ResourceFamily::Databricks, SUB);
    generator
        .init_resources(&client, &Scope::parse(" b ,a, b"), &cancel)
        .await
        .unwrap();

    assert_eq!(
        client.listed_paths(),
        vec![
            rg_list("b", "Microsoft.Databricks/workspaces"),
            rg_list("a", "Microsoft.Databricks/workspaces"),
            rg_list("b", "Microsoft.Databricks/workspaces"),
        ]
    );
    let calls = client.get_calls();
    assert!(calls
        .iter()
        .all(|c| c.api_version.as_deref() == Some("2018-04-01")));
}

#[tokio::test]
async fn test_identical_display_names_are_kept_apart() {
    let first = resource_id("net", "Microsoft.Network/routeTables", "edge-rt");
    let second = resource_id("net", "Microsoft.Network/routeTables", "edge.rt");
    let client = MockClient::new().with_list(
        rg_list("net", "Microsoft.Network/routeTables"),
        vec![entity(&first, "edge-rt"), entity(&second, "edge.rt")],
    );

    let cancel = CancellationToken::new();
    let mut generator = Generator::new(ResourceFamily::RouteTable, SUB);
    generator
        .init_resources(&client, &Scope::parse("net"), &cancel)
        .await
        .unwrap();

    let resources = generator.resources();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0].local_name, "net_edge_rt");
    assert_ne!(resources[0].local_name, resources[1].local_name);
    assert!(resources[1].local_name.starts_with("net_edge_rt_"));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let table = resource_id("net", "Microsoft.Network/routeTables", "rt");
    let client = MockClient::new()
        .with_pages(
            rg_list("net", "Microsoft.Network/routeTables"),
            vec![vec![entity(&table, "rt")], vec![]],
        )
        .with_list(
            format!("{}/routes", table),
            vec![entity(&format!("{}/routes/default", table), "default")],
        );

    let cancel = CancellationToken::new();
    let scope = Scope::parse("net");
    let mut generator = Generator::new(ResourceFamily::RouteTable, SUB);

    generator.init_resources(&client, &scope, &cancel).await.unwrap();
    let first = generator.resources().to_vec();
    generator.init_resources(&client, &scope, &cancel).await.unwrap();

    assert_eq!(first, generator.resources());
    assert_eq!(names(&generator), vec!["net_rt", "net_rt_default"]);
}

#[tokio::test]
async fn test_virtual_network_ignores_inline_subnets() {
    let vnet = resource_id("net", "Microsoft.Network/virtualNetworks", "hub");
    let client = MockClient::new()
        .with_list(
            sub_list("Microsoft.Network/virtualNetworks"),
            vec![entity(&vnet, "hub")],
        )
        .with_list(
            format!("{}/virtualNetworkPeerings", vnet),
            vec![entity(&format!("{}/virtualNetworkPeerings/to-spoke", vnet), "to-spoke")],
        );

    let cancel = CancellationToken::new();
    let mut generator = Generator::new(ResourceFamily::VirtualNetwork, SUB);
    generator
        .init_resources(&client, &Scope::subscription(), &cancel)
        .await
        .unwrap();

    let resources = generator.resources();
    assert_eq!(resources[0].ignored_attributes, vec!["subnet".to_string()]);
    assert_eq!(resources[1].resource_type, "azurerm_virtual_network_peering");
    assert_eq!(resources[1].local_name, "net_hub_to_spoke");
}

#[tokio::test]
async fn test_ids_are_normalized_and_bad_entities_skipped() {
    let good = resource_id("net", "Microsoft.Network/networkSecurityGroups", "web-nsg")
        .replace("resourceGroups", "resourcegroups");
    let client = MockClient::new().with_list(
        rg_list("net", "Microsoft.Network/networkSecurityGroups"),
        vec![
            entity(&good, "web-nsg"),
            json!({"id": null, "name": "ghost"}),
            entity("/not/a/resource", "broken"),
        ],
    );

    let cancel = CancellationToken::new();
    let mut generator = Generator::new(ResourceFamily::NetworkSecurityGroup, SUB);
    generator
        .init_resources(&client, &Scope::parse("net"), &cancel)
        .await
        .unwrap();

    assert_eq!(generator.resources().len(), 1);
    assert_eq!(generator.resources()[0].id, ids::normalize(&good));
    assert!(generator.resources()[0].id.contains("/resourceGroups/"));
}

#[tokio::test]
async fn test_page_failure_returns_partial_records() {
    let path = rg_list("net", "Microsoft.Network/privateEndpoints");
    let client = MockClient::new()
        .with_pages(
            path.clone(),
            vec![
                vec![entity(&resource_id("net", "Microsoft.Network/privateEndpoints", "pe-1"), "pe-1")],
                vec![entity(&resource_id("net", "Microsoft.Network/privateEndpoints", "pe-2"), "pe-2")],
            ],
        )
        .fail_on_page(path, 1, ProviderError::status(503, "ServiceUnavailable"));

    let cancel = CancellationToken::new();
    let mut generator = Generator::new(ResourceFamily::PrivateEndpoint, SUB);
    let err = generator
        .init_resources(&client, &Scope::parse("net"), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err.root(), DiscoveryError::Provider { .. }));
    assert!(err.to_string().contains("private_endpoint"));
    assert_eq!(generator.state(), &GeneratorState::Done);
    assert_eq!(names(&generator), vec!["net_pe_1"]);
}

#[tokio::test]
async fn test_child_failure_keeps_built_siblings() {
    let first = resource_id("net", "Microsoft.Network/routeTables", "a");
    let second = resource_id("net", "Microsoft.Network/routeTables", "b");
    let client = MockClient::new()
        .with_list(
            rg_list("net", "Microsoft.Network/routeTables"),
            vec![entity(&first, "a"), entity(&second, "b")],
        )
        .with_list(
            format!("{}/routes", first),
            vec![entity(&format!("{}/routes/r1", first), "r1")],
        )
        .fail_on(format!("{}/routes", second), ProviderError::status(404, "NotFound"));

    let cancel = CancellationToken::new();
    let mut generator = Generator::new(ResourceFamily::RouteTable, SUB);
    let err = generator
        .init_resources(&client, &Scope::parse("net"), &cancel)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("/routeTables/b/routes"));
    assert_eq!(names(&generator), vec!["net_a", "net_a_r1", "net_b"]);
    // route filters are never reached
    assert!(!client.was_called(&rg_list("net", "Microsoft.Network/routeFilters")));
}

#[tokio::test]
async fn test_cancellation_is_not_a_provider_error() {
    let table = resource_id("net", "Microsoft.Network/routeTables", "rt");
    let client = MockClient::new()
        .with_list(
            rg_list("net", "Microsoft.Network/routeTables"),
            vec![entity(&table, "rt")],
        )
        .cancel_after(1);

    let cancel = CancellationToken::new();
    let mut generator = Generator::new(ResourceFamily::RouteTable, SUB);
    let err = generator
        .init_resources(&client, &Scope::parse("net, other"), &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(!matches!(err.root(), DiscoveryError::Provider { .. }));
    assert_eq!(generator.state(), &GeneratorState::Failed);
    assert_eq!(names(&generator), vec!["net_rt"]);
    assert_eq!(client.call_count(), 1);
}
