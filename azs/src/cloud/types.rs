//! Typed shapes of the `az --output json` wire contract
//!
//! Field renames follow the CLI's camelCase JSON. Everything optional in
//! practice is `Option` or defaulted so partially-populated tenants do not
//! break decoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An Azure subscription as returned by `az account list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub name: String,
    #[serde(rename = "tenantId", default)]
    pub tenant_id: String,
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
}

/// A resource group as returned by `az group list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub name: String,
    pub location: String,
    #[serde(default, deserialize_with = "null_tags")]
    pub tags: BTreeMap<String, String>,
}

/// A resource as returned by `az resource list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub location: String,
    #[serde(rename = "resourceGroup", default)]
    pub resource_group: String,
    #[serde(default, deserialize_with = "null_tags")]
    pub tags: BTreeMap<String, String>,
    /// Provisioning/power state when the listing includes one
    #[serde(default)]
    pub status: Option<String>,
}

impl Resource {
    /// Project into the search engine's indexable record shape
    pub fn to_record(&self) -> resq::Record {
        resq::Record {
            id: self.id.clone(),
            name: self.name.clone(),
            resource_type: self.resource_type.clone(),
            resource_group: self.resource_group.clone(),
            location: self.location.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// `az` serializes absent tags as `null`, not `{}`
fn null_tags<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<BTreeMap<String, String>> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// Coarse health derived from a resource's reported status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Health {
    Healthy,
    Warning,
    Critical,
    #[default]
    Unknown,
}

impl Health {
    /// Single-glyph indicator for the tree and dashboard
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Healthy => "✓",
            Self::Warning => "⚠",
            Self::Critical => "✗",
            Self::Unknown => "?",
        }
    }

    /// Map a status string onto a health bucket
    pub fn from_status(status: Option<&str>) -> Self {
        let Some(status) = status else {
            return Self::Unknown;
        };
        match status.to_lowercase().as_str() {
            "succeeded" | "running" | "ready" | "available" | "vm running" => Self::Healthy,
            "updating" | "creating" | "starting" | "stopping" | "deallocating" | "degraded" => Self::Warning,
            "failed" | "stopped" | "deallocated" | "vm stopped" | "vm deallocated" | "unavailable" => Self::Critical,
            _ => Self::Unknown,
        }
    }
}

/// A blob container under a storage account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    #[serde(rename = "lastModified", default)]
    pub last_modified: Option<String>,
}

/// A blob inside a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(rename = "contentType", default)]
    pub content_type: Option<String>,
}

/// A key vault secret reference (metadata only, never the value)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretItem {
    pub name: String,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// A pod inside an AKS cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub phase: Option<String>,
}

/// An Azure DevOps organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// An Azure DevOps project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// An Azure DevOps pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub folder: Option<String>,
}

/// Operations supported by the external infrastructure tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOp {
    Init,
    Plan,
    Apply,
    Validate,
    Fmt,
    Destroy,
    Show,
    Output,
    StateList,
    WorkspaceList,
    WorkspaceSelect,
}

impl ToolOp {
    pub const ALL: &'static [ToolOp] = &[
        Self::Init,
        Self::Plan,
        Self::Apply,
        Self::Validate,
        Self::Fmt,
        Self::Destroy,
        Self::Show,
        Self::Output,
        Self::StateList,
        Self::WorkspaceList,
        Self::WorkspaceSelect,
    ];

    /// Does this operation take an extra operand (e.g. a workspace name)?
    pub fn wants_operand(&self) -> bool {
        matches!(self, Self::WorkspaceSelect)
    }

    /// CLI argument vector for this operation
    pub fn args(&self) -> Vec<String> {
        let parts: &[&str] = match self {
            Self::Init => &["init", "-no-color"],
            Self::Plan => &["plan", "-no-color"],
            Self::Apply => &["apply", "-auto-approve", "-no-color"],
            Self::Validate => &["validate", "-no-color"],
            Self::Fmt => &["fmt", "-recursive"],
            Self::Destroy => &["destroy", "-auto-approve", "-no-color"],
            Self::Show => &["show", "-no-color"],
            Self::Output => &["output", "-no-color"],
            Self::StateList => &["state", "list"],
            Self::WorkspaceList => &["workspace", "list"],
            Self::WorkspaceSelect => &["workspace", "select"],
        };
        parts.iter().map(|s| s.to_string()).collect()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Plan => "plan",
            Self::Apply => "apply",
            Self::Validate => "validate",
            Self::Fmt => "fmt",
            Self::Destroy => "destroy",
            Self::Show => "show",
            Self::Output => "output",
            Self::StateList => "state list",
            Self::WorkspaceList => "workspace list",
            Self::WorkspaceSelect => "workspace select",
        }
    }

    /// Destroy is the only operation that tears resources down
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::Destroy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_decodes_az_json() {
        let json = r#"{
            "id": "/subscriptions/s1/resourceGroups/rg1/providers/Microsoft.Compute/virtualMachines/vm1",
            "name": "vm1",
            "type": "Microsoft.Compute/virtualMachines",
            "location": "eastus",
            "resourceGroup": "rg1",
            "tags": {"env": "prod"}
        }"#;
        let r: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(r.resource_type, "Microsoft.Compute/virtualMachines");
        assert_eq!(r.tags.get("env").map(String::as_str), Some("prod"));
        assert!(r.status.is_none());
    }

    #[test]
    fn test_null_tags_decode_as_empty() {
        let json = r#"{"name": "rg1", "location": "eastus", "tags": null}"#;
        let g: ResourceGroup = serde_json::from_str(json).unwrap();
        assert!(g.tags.is_empty());
    }

    #[test]
    fn test_health_mapping() {
        assert_eq!(Health::from_status(Some("Succeeded")), Health::Healthy);
        assert_eq!(Health::from_status(Some("VM running")), Health::Healthy);
        assert_eq!(Health::from_status(Some("Updating")), Health::Warning);
        assert_eq!(Health::from_status(Some("Failed")), Health::Critical);
        assert_eq!(Health::from_status(Some("weird")), Health::Unknown);
        assert_eq!(Health::from_status(None), Health::Unknown);
    }

    #[test]
    fn test_health_glyphs() {
        assert_eq!(Health::Healthy.glyph(), "✓");
        assert_eq!(Health::Warning.glyph(), "⚠");
        assert_eq!(Health::Critical.glyph(), "✗");
        assert_eq!(Health::Unknown.glyph(), "?");
    }

    #[test]
    fn test_to_record_projection() {
        let r = Resource {
            id: "/x".to_string(),
            name: "vm1".to_string(),
            resource_type: "Microsoft.Compute/virtualMachines".to_string(),
            location: "eastus".to_string(),
            resource_group: "rg1".to_string(),
            tags: BTreeMap::new(),
            status: Some("VM running".to_string()),
        };
        let rec = r.to_record();
        assert_eq!(rec.name, "vm1");
        assert_eq!(rec.resource_group, "rg1");
    }

    #[test]
    fn test_tool_op_args() {
        assert_eq!(ToolOp::StateList.args(), vec!["state", "list"]);
        assert!(ToolOp::Destroy.is_destructive());
        assert!(!ToolOp::Plan.is_destructive());
    }

    #[test]
    fn test_all_covers_every_operation() {
        assert_eq!(ToolOp::ALL.len(), 11);
        assert!(ToolOp::ALL.contains(&ToolOp::WorkspaceSelect));
        assert!(ToolOp::WorkspaceSelect.wants_operand());
        assert!(ToolOp::ALL.iter().filter(|op| op.wants_operand()).count() == 1);
    }
}
