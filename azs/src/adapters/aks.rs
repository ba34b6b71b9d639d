//! AKS cluster adapter

use serde_json::Value;

use super::{ActionKind, ActionSpec, ResourceAdapter, named_args};
use crate::cloud::{Pod, Resource};

pub struct AksAdapter;

const ACTIONS: &[ActionSpec] = &[
    ActionSpec::listing('P', "pods", ActionKind::Pods),
    ActionSpec::mutate('S', "start"),
    ActionSpec::mutate('K', "stop"),
    ActionSpec::destructive('X', "delete"),
];

impl ResourceAdapter for AksAdapter {
    fn display_name(&self) -> &'static str {
        "AKS Cluster"
    }

    fn matches(&self, type_lower: &str) -> bool {
        type_lower.starts_with("microsoft.containerservice/managedclusters")
    }

    fn actions(&self) -> &'static [ActionSpec] {
        ACTIONS
    }

    fn mutate_args(&self, resource: &Resource, spec: &ActionSpec, _details: Option<&Value>) -> Result<Vec<String>, String> {
        match spec.key {
            'S' => Ok(named_args("aks", "start", resource, &[])),
            'K' => Ok(named_args("aks", "stop", resource, &[])),
            'X' => Ok(named_args("aks", "delete", resource, &["--yes"])),
            _ => Err(format!("no AKS action bound to '{}'", spec.key)),
        }
    }
}

/// Format a pod listing for the content pane
pub fn render_pods(cluster: &str, pods: &[Pod]) -> String {
    if pods.is_empty() {
        return format!(
            "No pods visible in {}.\nPossible causes: credentials not merged (az aks get-credentials) or an empty cluster.",
            cluster
        );
    }
    let mut out = format!("Pods in {} ({})\n\n", cluster, pods.len());
    out.push_str(&format!("  {:<16} {:<48} {}\n", "NAMESPACE", "NAME", "PHASE"));
    for p in pods {
        out.push_str(&format!(
            "  {:<16} {:<48} {}\n",
            p.namespace,
            p.name,
            p.phase.as_deref().unwrap_or("-")
        ));
    }
    out
}
