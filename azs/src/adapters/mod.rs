//! Resource-family adapters
//!
//! Each adapter is a pure command factory plus a renderer: it declares the
//! context-sensitive keymap for its resource types and builds the argv for
//! mutating actions. Listing actions (`Containers`, `Secrets`, ...) are
//! declared here and executed generically by the reducer through the
//! dispatcher.
//!
//! Preconditions are checked in `mutate_args`: a failing precondition
//! returns a user-facing message and nothing is dispatched.

pub mod aci;
pub mod aks;
pub mod keyvault;
pub mod network;
pub mod storage;
pub mod vm;

use serde_json::Value;

use crate::cloud::Resource;

/// What kind of work an action dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Build argv via [`ResourceAdapter::mutate_args`] and run it
    Mutate,
    /// List blob containers under a storage account
    Containers,
    /// List blobs inside the most recently listed container
    Blobs,
    /// List key vault secrets (metadata only)
    Secrets,
    /// List pods of an AKS cluster
    Pods,
}

/// One keymap entry: a case-sensitive letter bound to a logical action
#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    pub key: char,
    pub label: &'static str,
    pub kind: ActionKind,
    pub destructive: bool,
}

impl ActionSpec {
    pub const fn mutate(key: char, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: ActionKind::Mutate,
            destructive: false,
        }
    }

    pub const fn destructive(key: char, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: ActionKind::Mutate,
            destructive: true,
        }
    }

    pub const fn listing(key: char, label: &'static str, kind: ActionKind) -> Self {
        Self {
            key,
            label,
            kind,
            destructive: false,
        }
    }
}

/// A resource family's command factory + keymap
pub trait ResourceAdapter: Send + Sync {
    fn display_name(&self) -> &'static str;

    /// Does this adapter own the given (lowercased) resource type?
    fn matches(&self, type_lower: &str) -> bool;

    fn actions(&self) -> &'static [ActionSpec];

    /// Build the `az` argv for a `Mutate` action. A precondition failure
    /// comes back as a user-facing message; nothing is dispatched.
    fn mutate_args(&self, resource: &Resource, spec: &ActionSpec, details: Option<&Value>) -> Result<Vec<String>, String>;

    /// Compact shortcut list for the status bar
    fn shortcuts(&self) -> String {
        self.actions()
            .iter()
            .map(|a| format!("{}:{}", a.key, a.label))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

static ADAPTERS: [&(dyn ResourceAdapter); 6] = [
    &vm::VmAdapter,
    &storage::StorageAdapter,
    &keyvault::KeyVaultAdapter,
    &aks::AksAdapter,
    &aci::AciAdapter,
    &network::NetworkAdapter,
];

/// Find the adapter owning a resource type, if any
pub fn adapter_for(resource_type: &str) -> Option<&'static dyn ResourceAdapter> {
    let lower = resource_type.to_lowercase();
    ADAPTERS.iter().copied().find(|a| a.matches(&lower))
}

/// Resolve a context-sensitive key press against a resource type
pub fn action_for_key(resource_type: &str, key: char) -> Option<(&'static dyn ResourceAdapter, &'static ActionSpec)> {
    let adapter = adapter_for(resource_type)?;
    let spec = adapter.actions().iter().find(|a| a.key == key)?;
    Some((adapter, spec))
}

/// Shared argv builder for `--ids`-addressed verbs
pub(crate) fn ids_args(family: &str, verb: &str, id: &str, extra: &[&str]) -> Vec<String> {
    let mut args = vec![family.to_string(), verb.to_string(), "--ids".to_string(), id.to_string()];
    args.extend(extra.iter().map(|s| s.to_string()));
    args
}

/// Shared argv builder for name+group-addressed verbs
pub(crate) fn named_args(family: &str, verb: &str, resource: &Resource, extra: &[&str]) -> Vec<String> {
    let mut args = vec![
        family.to_string(),
        verb.to_string(),
        "--name".to_string(),
        resource.name.clone(),
        "--resource-group".to_string(),
        resource.resource_group.clone(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_covers_core_types() {
        for rtype in [
            "Microsoft.Compute/virtualMachines",
            "Microsoft.Storage/storageAccounts",
            "Microsoft.KeyVault/vaults",
            "Microsoft.ContainerService/managedClusters",
            "Microsoft.ContainerInstance/containerGroups",
            "Microsoft.Network/virtualNetworks",
        ] {
            assert!(adapter_for(rtype).is_some(), "no adapter for {}", rtype);
        }
        assert!(adapter_for("Microsoft.Unknown/widgets").is_none());
    }

    #[test]
    fn test_keymaps_have_unique_keys() {
        for adapter in ADAPTERS {
            let mut seen = HashSet::new();
            for spec in adapter.actions() {
                assert!(
                    seen.insert(spec.key),
                    "{} binds {} twice",
                    adapter.display_name(),
                    spec.key
                );
            }
        }
    }

    #[test]
    fn test_action_for_key_resolves() {
        let (adapter, spec) = action_for_key("Microsoft.Compute/virtualMachines", 'S').unwrap();
        assert_eq!(adapter.display_name(), "Virtual Machine");
        assert_eq!(spec.label, "start");
        assert!(action_for_key("Microsoft.Compute/virtualMachines", 'z').is_none());
    }

    #[test]
    fn test_destructive_actions_marked() {
        for adapter in ADAPTERS {
            for spec in adapter.actions() {
                if spec.label.contains("delete") {
                    assert!(spec.destructive, "{} delete not destructive", adapter.display_name());
                }
            }
        }
    }
}
