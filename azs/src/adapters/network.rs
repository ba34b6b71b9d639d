//! Network resource adapter
//!
//! Covers the whole Microsoft.Network family. Mutations are limited to
//! deletion; the interesting surface for network resources is the details
//! view.

use serde_json::Value;

use super::{ActionSpec, ResourceAdapter, ids_args};
use crate::cloud::Resource;

pub struct NetworkAdapter;

const ACTIONS: &[ActionSpec] = &[ActionSpec::destructive('X', "delete")];

impl ResourceAdapter for NetworkAdapter {
    fn display_name(&self) -> &'static str {
        "Network"
    }

    fn matches(&self, type_lower: &str) -> bool {
        type_lower.starts_with("microsoft.network/")
    }

    fn actions(&self) -> &'static [ActionSpec] {
        ACTIONS
    }

    fn mutate_args(&self, resource: &Resource, spec: &ActionSpec, _details: Option<&Value>) -> Result<Vec<String>, String> {
        match spec.key {
            'X' => Ok(ids_args("resource", "delete", &resource.id, &[])),
            _ => Err(format!("no network action bound to '{}'", spec.key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_delete() {
        let resource = Resource {
            id: "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet1".to_string(),
            name: "vnet1".to_string(),
            resource_type: "Microsoft.Network/virtualNetworks".to_string(),
            location: "eastus".to_string(),
            resource_group: "rg".to_string(),
            tags: Default::default(),
            status: None,
        };
        let spec = &ACTIONS[0];
        let args = NetworkAdapter.mutate_args(&resource, spec, None).unwrap();
        assert_eq!(args[..3], ["resource", "delete", "--ids"]);
    }

    #[test]
    fn test_matches_whole_family() {
        assert!(NetworkAdapter.matches("microsoft.network/publicipaddresses"));
        assert!(NetworkAdapter.matches("microsoft.network/virtualnetworks"));
        assert!(!NetworkAdapter.matches("microsoft.compute/virtualmachines"));
    }
}
