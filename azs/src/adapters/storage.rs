//! Storage account adapter

use serde_json::Value;

use super::{ActionKind, ActionSpec, ResourceAdapter};
use crate::cloud::{Blob, Container, Resource};

pub struct StorageAdapter;

const ACTIONS: &[ActionSpec] = &[
    ActionSpec::listing('C', "containers", ActionKind::Containers),
    ActionSpec::listing('B', "blobs", ActionKind::Blobs),
    ActionSpec::destructive('X', "delete"),
];

impl ResourceAdapter for StorageAdapter {
    fn display_name(&self) -> &'static str {
        "Storage Account"
    }

    fn matches(&self, type_lower: &str) -> bool {
        type_lower.starts_with("microsoft.storage/storageaccounts")
    }

    fn actions(&self) -> &'static [ActionSpec] {
        ACTIONS
    }

    fn mutate_args(&self, resource: &Resource, spec: &ActionSpec, _details: Option<&Value>) -> Result<Vec<String>, String> {
        match spec.key {
            'X' => Ok(["storage", "account", "delete", "--ids", &resource.id, "--yes"]
                .iter()
                .map(|s| s.to_string())
                .collect()),
            _ => Err(format!("no storage action bound to '{}'", spec.key)),
        }
    }
}

/// Format a container listing for the content pane
pub fn render_containers(account: &str, containers: &[Container]) -> String {
    if containers.is_empty() {
        return format!(
            "No containers in {}.\nPossible causes: no data plane access, wrong subscription, or the account is empty.",
            account
        );
    }
    let mut out = format!("Containers in {} ({})\n\n", account, containers.len());
    for c in containers {
        let modified = c.last_modified.as_deref().unwrap_or("-");
        out.push_str(&format!("  {:<40} {}\n", c.name, modified));
    }
    out
}

/// Format a blob listing for the content pane
pub fn render_blobs(container: &str, blobs: &[Blob]) -> String {
    if blobs.is_empty() {
        return format!("Container {} is empty.", container);
    }
    let mut out = format!("Blobs in {} ({})\n\n", container, blobs.len());
    for b in blobs {
        let size = b.size.map(format_size).unwrap_or_else(|| "-".to_string());
        let kind = b.content_type.as_deref().unwrap_or("-");
        out.push_str(&format!("  {:<48} {:>10}  {}\n", b.name, size, kind));
    }
    out
}

fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
