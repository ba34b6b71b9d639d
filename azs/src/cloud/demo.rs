//! In-memory demo implementation of the cloud CLI
//!
//! Deterministic dataset used in three places: `--demo` mode, the timeout
//! fallback for listings, and tests. Responses are instant and never
//! fail.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::cli::CloudCli;
use super::error::CloudError;
use super::types::{
    Blob, Container, Organization, Pipeline, Pod, Project, Resource, ResourceGroup, SecretItem, Subscription, ToolOp,
};

const DEMO_TENANT: &str = "00000000-0000-0000-0000-00000000feed";

/// Fixed demo dataset provider
#[derive(Debug, Default)]
pub struct DemoCli;

impl DemoCli {
    pub fn new() -> Self {
        Self
    }

    /// The demo subscriptions, also used directly for timeout fallback
    pub fn subscriptions() -> Vec<Subscription> {
        vec![
            Subscription {
                id: "11111111-1111-1111-1111-111111111111".to_string(),
                name: "Contoso Production".to_string(),
                tenant_id: DEMO_TENANT.to_string(),
                is_default: true,
            },
            Subscription {
                id: "22222222-2222-2222-2222-222222222222".to_string(),
                name: "Contoso Development".to_string(),
                tenant_id: DEMO_TENANT.to_string(),
                is_default: false,
            },
        ]
    }

    pub fn groups() -> Vec<ResourceGroup> {
        vec![
            ResourceGroup {
                name: "rg-web-prod".to_string(),
                location: "eastus".to_string(),
                tags: [("env".to_string(), "production".to_string())].into(),
            },
            ResourceGroup {
                name: "rg-data-prod".to_string(),
                location: "eastus".to_string(),
                tags: [("env".to_string(), "production".to_string())].into(),
            },
            ResourceGroup {
                name: "rg-sandbox".to_string(),
                location: "westeurope".to_string(),
                tags: Default::default(),
            },
        ]
    }

    pub fn resources(group: &str) -> Vec<Resource> {
        let mk = |name: &str, rtype: &str, location: &str, status: &str| Resource {
            id: format!(
                "/subscriptions/11111111-1111-1111-1111-111111111111/resourceGroups/{}/providers/{}/{}",
                group, rtype, name
            ),
            name: name.to_string(),
            resource_type: rtype.to_string(),
            location: location.to_string(),
            resource_group: group.to_string(),
            tags: [("env".to_string(), "production".to_string())].into(),
            status: Some(status.to_string()),
        };

        match group {
            "rg-web-prod" => vec![
                mk("webapp-prod-01", "Microsoft.Compute/virtualMachines", "eastus", "VM running"),
                mk("webapp-prod-02", "Microsoft.Compute/virtualMachines", "eastus", "VM deallocated"),
                mk("web-lb-pip", "Microsoft.Network/publicIPAddresses", "eastus", "Succeeded"),
                mk("vnet-web", "Microsoft.Network/virtualNetworks", "eastus", "Succeeded"),
            ],
            "rg-data-prod" => vec![
                mk("stcontosodata", "Microsoft.Storage/storageAccounts", "eastus", "available"),
                mk("kv-contoso-prod", "Microsoft.KeyVault/vaults", "eastus", "Succeeded"),
                mk("aks-contoso", "Microsoft.ContainerService/managedClusters", "eastus", "Succeeded"),
                mk("sql-contoso", "Microsoft.Sql/servers", "eastus", "Ready"),
            ],
            _ => vec![
                mk("aci-scratch", "Microsoft.ContainerInstance/containerGroups", "westeurope", "Running"),
                mk("stscratch", "Microsoft.Storage/storageAccounts", "westeurope", "available"),
            ],
        }
    }
}

#[async_trait]
impl CloudCli for DemoCli {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, CloudError> {
        Ok(Self::subscriptions())
    }

    async fn set_subscription(&self, _id: &str) -> Result<(), CloudError> {
        Ok(())
    }

    async fn list_groups(&self, _subscription: &str) -> Result<Vec<ResourceGroup>, CloudError> {
        Ok(Self::groups())
    }

    async fn list_resources(&self, _subscription: &str, group: &str) -> Result<Vec<Resource>, CloudError> {
        Ok(Self::resources(group))
    }

    async fn describe_resource(&self, id: &str) -> Result<Value, CloudError> {
        Ok(json!({
            "id": id,
            "properties": {
                "provisioningState": "Succeeded",
                "hardwareProfile": { "vmSize": "Standard_D2s_v5" },
                "networkProfile": {
                    "publicIpAddress": "203.0.113.17",
                    "privateIpAddress": "10.0.1.4"
                },
                "osProfile": { "computerName": "demo", "adminUsername": "azureuser" }
            },
            "sku": { "name": "Standard" },
            "zones": ["1"]
        }))
    }

    async fn mutate(&self, _args: &[String]) -> Result<Option<Value>, CloudError> {
        Ok(Some(json!({ "status": "Succeeded" })))
    }

    async fn list_containers(&self, _account: &str) -> Result<Vec<Container>, CloudError> {
        Ok(vec![
            Container {
                name: "backups".to_string(),
                last_modified: Some("2026-07-01T00:00:00Z".to_string()),
            },
            Container {
                name: "logs".to_string(),
                last_modified: Some("2026-07-30T00:00:00Z".to_string()),
            },
        ])
    }

    async fn list_blobs(&self, _account: &str, container: &str) -> Result<Vec<Blob>, CloudError> {
        Ok(vec![
            Blob {
                name: format!("{}/2026-07-30.tar.gz", container),
                size: Some(10_485_760),
                content_type: Some("application/gzip".to_string()),
            },
            Blob {
                name: format!("{}/2026-07-31.tar.gz", container),
                size: Some(10_813_440),
                content_type: Some("application/gzip".to_string()),
            },
        ])
    }

    async fn list_secrets(&self, _vault: &str) -> Result<Vec<SecretItem>, CloudError> {
        Ok(vec![
            SecretItem {
                name: "db-password".to_string(),
                enabled: Some(true),
            },
            SecretItem {
                name: "api-token".to_string(),
                enabled: Some(true),
            },
            SecretItem {
                name: "legacy-cert".to_string(),
                enabled: Some(false),
            },
        ])
    }

    async fn list_pods(&self, _cluster: &str, _group: &str) -> Result<Vec<Pod>, CloudError> {
        Ok(vec![
            Pod {
                name: "web-5f7d8-abcde".to_string(),
                namespace: "default".to_string(),
                phase: Some("Running".to_string()),
            },
            Pod {
                name: "worker-9c1b2-fghij".to_string(),
                namespace: "jobs".to_string(),
                phase: Some("Pending".to_string()),
            },
        ])
    }

    async fn devops_organizations(&self) -> Result<Vec<Organization>, CloudError> {
        Ok(vec![Organization {
            name: "contoso".to_string(),
            url: Some("https://dev.azure.com/contoso".to_string()),
        }])
    }

    async fn devops_projects(&self, _org: &str) -> Result<Vec<Project>, CloudError> {
        Ok(vec![
            Project {
                id: "p1".to_string(),
                name: "platform".to_string(),
                description: Some("Shared platform services".to_string()),
            },
            Project {
                id: "p2".to_string(),
                name: "storefront".to_string(),
                description: None,
            },
        ])
    }

    async fn devops_pipelines(&self, _org: &str, project: &str) -> Result<Vec<Pipeline>, CloudError> {
        Ok(vec![
            Pipeline {
                id: 1,
                name: format!("{}-ci", project),
                folder: Some("\\".to_string()),
            },
            Pipeline {
                id: 2,
                name: format!("{}-release", project),
                folder: Some("\\deploy".to_string()),
            },
        ])
    }

    async fn run_tool(&self, dir: &Path, op: ToolOp, operand: Option<&str>) -> Result<String, CloudError> {
        let mut label = op.label().to_string();
        if let Some(operand) = operand {
            label.push(' ');
            label.push_str(operand);
        }
        Ok(format!(
            "demo: terraform {} in {} - no changes. Infrastructure is up-to-date.",
            label,
            dir.display()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_dataset_is_deterministic() {
        let cli = DemoCli::new();
        let a = cli.list_subscriptions().await.unwrap();
        let b = cli.list_subscriptions().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert!(a[0].is_default);
    }

    #[tokio::test]
    async fn test_demo_groups_have_resources() {
        let cli = DemoCli::new();
        for group in DemoCli::groups() {
            let resources = cli.list_resources("11111111-1111-1111-1111-111111111111", &group.name).await.unwrap();
            assert!(!resources.is_empty(), "group {} is empty", group.name);
            for r in &resources {
                assert_eq!(r.resource_group, group.name);
            }
        }
    }

    #[tokio::test]
    async fn test_demo_describe_has_public_ip() {
        let cli = DemoCli::new();
        let v = cli.describe_resource("/x").await.unwrap();
        assert!(v.pointer("/properties/networkProfile/publicIpAddress").is_some());
    }
}
