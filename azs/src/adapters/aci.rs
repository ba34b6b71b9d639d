//! Container instance adapter

use serde_json::Value;

use super::{ActionSpec, ResourceAdapter, named_args};
use crate::cloud::Resource;

pub struct AciAdapter;

const ACTIONS: &[ActionSpec] = &[
    ActionSpec::mutate('S', "start"),
    ActionSpec::mutate('K', "stop"),
    ActionSpec::mutate('B', "restart"),
    ActionSpec::mutate('L', "logs"),
    ActionSpec::destructive('X', "delete"),
];

impl ResourceAdapter for AciAdapter {
    fn display_name(&self) -> &'static str {
        "Container Instance"
    }

    fn matches(&self, type_lower: &str) -> bool {
        type_lower.starts_with("microsoft.containerinstance/containergroups")
    }

    fn actions(&self) -> &'static [ActionSpec] {
        ACTIONS
    }

    fn mutate_args(&self, resource: &Resource, spec: &ActionSpec, _details: Option<&Value>) -> Result<Vec<String>, String> {
        match spec.key {
            'S' => Ok(named_args("container", "start", resource, &[])),
            'K' => Ok(named_args("container", "stop", resource, &[])),
            'B' => Ok(named_args("container", "restart", resource, &[])),
            // One-shot snapshot; live streaming is out of scope
            'L' => Ok(named_args("container", "logs", resource, &[])),
            'X' => Ok(named_args("container", "delete", resource, &["--yes"])),
            _ => Err(format!("no container action bound to '{}'", spec.key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aci() -> Resource {
        Resource {
            id: "/x".to_string(),
            name: "aci-1".to_string(),
            resource_type: "Microsoft.ContainerInstance/containerGroups".to_string(),
            location: "westeurope".to_string(),
            resource_group: "rg-sandbox".to_string(),
            tags: Default::default(),
            status: None,
        }
    }

    #[test]
    fn test_logs_argv() {
        let spec = ACTIONS.iter().find(|a| a.key == 'L').unwrap();
        let args = AciAdapter.mutate_args(&aci(), spec, None).unwrap();
        assert_eq!(args[..2], ["container", "logs"]);
    }

    #[test]
    fn test_restart_argv() {
        let spec = ACTIONS.iter().find(|a| a.key == 'B').unwrap();
        let args = AciAdapter.mutate_args(&aci(), spec, None).unwrap();
        assert_eq!(args[1], "restart");
        assert!(args.contains(&"rg-sandbox".to_string()));
    }
}
