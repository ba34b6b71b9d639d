//! Key vault adapter
//!
//! Secrets are listed as metadata only. Secret values never transit the
//! TUI.

use serde_json::Value;

use super::{ActionKind, ActionSpec, ResourceAdapter, named_args};
use crate::cloud::{Resource, SecretItem};

pub struct KeyVaultAdapter;

const ACTIONS: &[ActionSpec] = &[
    ActionSpec::listing('V', "secrets", ActionKind::Secrets),
    ActionSpec::destructive('X', "delete"),
];

impl ResourceAdapter for KeyVaultAdapter {
    fn display_name(&self) -> &'static str {
        "Key Vault"
    }

    fn matches(&self, type_lower: &str) -> bool {
        type_lower.starts_with("microsoft.keyvault/vaults")
    }

    fn actions(&self) -> &'static [ActionSpec] {
        ACTIONS
    }

    fn mutate_args(&self, resource: &Resource, spec: &ActionSpec, _details: Option<&Value>) -> Result<Vec<String>, String> {
        match spec.key {
            'X' => Ok(named_args("keyvault", "delete", resource, &[])),
            _ => Err(format!("no key vault action bound to '{}'", spec.key)),
        }
    }
}

/// Format a secret listing for the content pane
pub fn render_secrets(vault: &str, secrets: &[SecretItem]) -> String {
    if secrets.is_empty() {
        return format!(
            "No secrets visible in {}.\nPossible causes: missing list permission or the vault is empty.",
            vault
        );
    }
    let mut out = format!("Secrets in {} ({})\n\n", vault, secrets.len());
    for s in secrets {
        let state = match s.enabled {
            Some(true) => "enabled",
            Some(false) => "disabled",
            None => "-",
        };
        out.push_str(&format!("  {:<40} {}\n", s.name, state));
    }
    out.push_str("\nValues are never fetched or displayed.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_secrets_hides_values() {
        let secrets = vec![SecretItem {
            name: "db-password".to_string(),
            enabled: Some(true),
        }];
        let text = render_secrets("kv-prod", &secrets);
        assert!(text.contains("db-password"));
        assert!(text.contains("never fetched"));
    }

    #[test]
    fn test_delete_argv_uses_name_and_group() {
        let resource = Resource {
            id: "/x".to_string(),
            name: "kv-prod".to_string(),
            resource_type: "Microsoft.KeyVault/vaults".to_string(),
            location: "eastus".to_string(),
            resource_group: "rg-sec".to_string(),
            tags: Default::default(),
            status: None,
        };
        let spec = ACTIONS.iter().find(|a| a.key == 'X').unwrap();
        let args = KeyVaultAdapter.mutate_args(&resource, spec, None).unwrap();
        assert_eq!(
            args,
            vec!["keyvault", "delete", "--name", "kv-prod", "--resource-group", "rg-sec"]
        );
    }
}
