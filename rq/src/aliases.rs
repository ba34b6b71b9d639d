//! Type alias table
//!
//! Maps short, human-friendly type names (`vm`, `aks`, `keyvault`) to the
//! canonical resource-type fragments they stand for. The table is policy,
//! not algorithm: adding an alias is a data change only.
//!
//! Matching is always against lowercased canonical type strings; an alias
//! expansion matches when the canonical type *contains* it.

/// Alias -> canonical type fragments (all lowercase).
///
/// An alias may expand to more than one fragment; a record's type matches
/// the alias when it contains any of them.
pub const TYPE_ALIASES: &[(&str, &[&str])] = &[
    ("vm", &["microsoft.compute/virtualmachines"]),
    ("vmss", &["microsoft.compute/virtualmachinescalesets"]),
    ("storage", &["microsoft.storage/storageaccounts"]),
    ("aks", &["microsoft.containerservice/managedclusters"]),
    ("keyvault", &["microsoft.keyvault/vaults"]),
    ("kv", &["microsoft.keyvault/vaults"]),
    ("sql", &["microsoft.sql/servers"]),
    ("acr", &["microsoft.containerregistry/registries"]),
    ("aci", &["microsoft.containerinstance/containergroups"]),
    ("webapp", &["microsoft.web/sites"]),
    ("function", &["microsoft.web/sites"]),
    ("network", &["microsoft.network/"]),
    ("vnet", &["microsoft.network/virtualnetworks"]),
    ("nsg", &["microsoft.network/networksecuritygroups"]),
    ("nic", &["microsoft.network/networkinterfaces"]),
    ("pip", &["microsoft.network/publicipaddresses"]),
    ("cosmos", &["microsoft.documentdb/databaseaccounts"]),
    ("redis", &["microsoft.cache/redis"]),
];

/// Look up the canonical fragments for an alias (case-insensitive).
pub fn expand(alias: &str) -> Option<&'static [&'static str]> {
    let lower = alias.to_lowercase();
    TYPE_ALIASES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, fragments)| *fragments)
}

/// All alias names, for suggestion generation.
pub fn alias_names() -> impl Iterator<Item = &'static str> {
    TYPE_ALIASES.iter().map(|(name, _)| *name)
}

/// Alias-aware type match: `token` may be an alias, a type fragment, or a
/// wildcard pattern; `type_lower` is the record's lowercased canonical type.
pub fn matches_type(token: &str, type_lower: &str) -> bool {
    let token_lower = token.to_lowercase();
    if let Some(fragments) = expand(&token_lower) {
        return fragments.iter().any(|f| type_lower.contains(f));
    }
    if crate::query::has_wildcards(&token_lower) {
        return crate::query::wildcard_regex(&token_lower)
            .map(|re| re.is_match(type_lower))
            .unwrap_or(false);
    }
    type_lower.contains(&token_lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_known_alias() {
        assert_eq!(expand("vm"), Some(&["microsoft.compute/virtualmachines"][..]));
        assert_eq!(expand("VM"), Some(&["microsoft.compute/virtualmachines"][..]));
        assert!(expand("zeppelin").is_none());
    }

    #[test]
    fn test_matches_type_alias() {
        assert!(matches_type("vm", "microsoft.compute/virtualmachines"));
        assert!(!matches_type("vm", "microsoft.storage/storageaccounts"));
    }

    #[test]
    fn test_matches_type_fragment() {
        // Non-alias tokens match by substring against the canonical type
        assert!(matches_type("virtualmachines", "microsoft.compute/virtualmachines"));
        assert!(matches_type("Compute", "microsoft.compute/virtualmachines"));
    }

    #[test]
    fn test_matches_type_wildcard() {
        assert!(matches_type("*network*", "microsoft.network/virtualnetworks"));
        assert!(!matches_type("*network*", "microsoft.compute/virtualmachines"));
    }

    #[test]
    fn test_family_alias_covers_subtypes() {
        // "network" is a family prefix, matching every network type
        assert!(matches_type("network", "microsoft.network/virtualnetworks"));
        assert!(matches_type("network", "microsoft.network/networksecuritygroups"));
    }
}
