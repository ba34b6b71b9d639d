//! Virtual machine adapter

use serde_json::Value;

use super::{ActionSpec, ResourceAdapter, ids_args};
use crate::cloud::Resource;

pub struct VmAdapter;

const ACTIONS: &[ActionSpec] = &[
    ActionSpec::mutate('S', "start"),
    ActionSpec::mutate('K', "stop"),
    ActionSpec::mutate('B', "restart"),
    ActionSpec::mutate('C', "ssh check"),
    ActionSpec::destructive('X', "delete"),
];

impl VmAdapter {
    /// Public IP from a `describe` payload, when the VM has one
    fn public_ip(details: Option<&Value>) -> Option<String> {
        details?
            .pointer("/properties/networkProfile/publicIpAddress")
            .and_then(Value::as_str)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
    }
}

impl ResourceAdapter for VmAdapter {
    fn display_name(&self) -> &'static str {
        "Virtual Machine"
    }

    fn matches(&self, type_lower: &str) -> bool {
        type_lower.starts_with("microsoft.compute/virtualmachines")
    }

    fn actions(&self) -> &'static [ActionSpec] {
        ACTIONS
    }

    fn mutate_args(&self, resource: &Resource, spec: &ActionSpec, details: Option<&Value>) -> Result<Vec<String>, String> {
        match spec.key {
            'S' => Ok(ids_args("vm", "start", &resource.id, &[])),
            // Deallocate rather than power off so compute stops billing
            'K' => Ok(ids_args("vm", "deallocate", &resource.id, &[])),
            'B' => Ok(ids_args("vm", "restart", &resource.id, &[])),
            'C' => {
                let ip = Self::public_ip(details)
                    .ok_or_else(|| format!("SSH requires a public IP - {} has none", resource.name))?;
                Ok(vec![
                    "ssh".to_string(),
                    "vm".to_string(),
                    "--ip".to_string(),
                    ip,
                    "--".to_string(),
                    "-o".to_string(),
                    "BatchMode=yes".to_string(),
                    "exit".to_string(),
                ])
            }
            'X' => Ok(ids_args("vm", "delete", &resource.id, &["--yes"])),
            _ => Err(format!("no VM action bound to '{}'", spec.key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vm() -> Resource {
        Resource {
            id: "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm1".to_string(),
            name: "vm1".to_string(),
            resource_type: "Microsoft.Compute/virtualMachines".to_string(),
            location: "eastus".to_string(),
            resource_group: "rg".to_string(),
            tags: Default::default(),
            status: None,
        }
    }

    #[test]
    fn test_start_argv() {
        let spec = ACTIONS.iter().find(|a| a.key == 'S').unwrap();
        let args = VmAdapter.mutate_args(&vm(), spec, None).unwrap();
        assert_eq!(args[..3], ["vm", "start", "--ids"]);
        assert_eq!(args[3], vm().id);
    }

    #[test]
    fn test_stop_deallocates() {
        let spec = ACTIONS.iter().find(|a| a.key == 'K').unwrap();
        let args = VmAdapter.mutate_args(&vm(), spec, None).unwrap();
        assert_eq!(args[1], "deallocate");
    }

    #[test]
    fn test_delete_is_destructive_and_confirmed() {
        let spec = ACTIONS.iter().find(|a| a.key == 'X').unwrap();
        assert!(spec.destructive);
        let args = VmAdapter.mutate_args(&vm(), spec, None).unwrap();
        assert!(args.contains(&"--yes".to_string()));
    }

    #[test]
    fn test_ssh_precondition_fails_without_public_ip() {
        let spec = ACTIONS.iter().find(|a| a.key == 'C').unwrap();
        let err = VmAdapter.mutate_args(&vm(), spec, None).unwrap_err();
        assert!(err.contains("public IP"));

        let details = json!({"properties": {"networkProfile": {"publicIpAddress": ""}}});
        assert!(VmAdapter.mutate_args(&vm(), spec, Some(&details)).is_err());
    }

    #[test]
    fn test_ssh_uses_public_ip() {
        let spec = ACTIONS.iter().find(|a| a.key == 'C').unwrap();
        let details = json!({"properties": {"networkProfile": {"publicIpAddress": "203.0.113.9"}}});
        let args = VmAdapter.mutate_args(&vm(), spec, Some(&details)).unwrap();
        assert!(args.contains(&"203.0.113.9".to_string()));
    }
}
