//! Incremental suggestions
//!
//! Given the token under the cursor, propose up to [`MAX_SUGGESTIONS`]
//! completions drawn from the indexed records and the alias table, in a
//! stable priority order: names, then types (and aliases), then locations,
//! then resource groups, then tag keys.

use std::collections::BTreeSet;

use crate::aliases;
use crate::engine::SearchEngine;

/// Upper bound on returned candidates
pub const MAX_SUGGESTIONS: usize = 10;

/// Suggestion candidates for a partial token (case-insensitive prefix).
///
/// A whitespace-only or empty token yields nothing.
pub fn suggestions(engine: &SearchEngine, partial: &str) -> Vec<String> {
    let needle = partial.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    // Collect per-category candidate sets; BTreeSet gives dedup + stable
    // alphabetical order within each category.
    let mut names = BTreeSet::new();
    let mut types = BTreeSet::new();
    let mut locations = BTreeSet::new();
    let mut groups = BTreeSet::new();
    let mut tag_keys = BTreeSet::new();

    for record in engine.records() {
        if record.name.to_lowercase().starts_with(&needle) {
            names.insert(record.name.clone());
        }
        if record.resource_type.to_lowercase().starts_with(&needle) {
            types.insert(record.resource_type.clone());
        }
        if record.location.to_lowercase().starts_with(&needle) {
            locations.insert(record.location.clone());
        }
        if record.resource_group.to_lowercase().starts_with(&needle) {
            groups.insert(record.resource_group.clone());
        }
        for key in record.tags.keys() {
            if key.to_lowercase().starts_with(&needle) {
                tag_keys.insert(key.clone());
            }
        }
    }
    for alias in aliases::alias_names() {
        if alias.starts_with(&needle) {
            types.insert(alias.to_string());
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(MAX_SUGGESTIONS);
    for bucket in [names, types, locations, groups, tag_keys] {
        for candidate in bucket {
            if out.len() >= MAX_SUGGESTIONS {
                return out;
            }
            if !out.contains(&candidate) {
                out.push(candidate);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn engine() -> SearchEngine {
        SearchEngine::with_records(vec![
            Record::new("/1", "web-prod", "Microsoft.Web/sites", "web-rg", "westus").with_tag("wave", "2"),
            Record::new("/2", "vm-01", "Microsoft.Compute/virtualMachines", "core-rg", "eastus"),
            Record::new("/3", "vm-02", "Microsoft.Compute/virtualMachines", "core-rg", "eastus2"),
        ])
    }

    #[test]
    fn test_name_prefix() {
        let s = suggestions(&engine(), "vm-");
        assert_eq!(s, vec!["vm-01", "vm-02"]);
    }

    #[test]
    fn test_priority_name_before_type_before_location() {
        // "w" hits the name web-prod, the alias webapp, the location westus,
        // the group web-rg, and the tag key wave - in that bucket order.
        let s = suggestions(&engine(), "w");
        assert_eq!(s, vec!["web-prod", "webapp", "westus", "web-rg", "wave"]);
    }

    #[test]
    fn test_alias_in_type_bucket() {
        let s = suggestions(&engine(), "keyv");
        assert_eq!(s, vec!["keyvault"]);
    }

    #[test]
    fn test_case_insensitive() {
        let s = suggestions(&engine(), "MICROSOFT.COMP");
        assert_eq!(s, vec!["Microsoft.Compute/virtualMachines"]);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(suggestions(&engine(), "").is_empty());
        assert!(suggestions(&engine(), "   ").is_empty());
    }

    #[test]
    fn test_capped_at_ten() {
        let records = (0..30)
            .map(|i| {
                Record::new(
                    format!("/{}", i),
                    format!("node-{:02}", i),
                    "Microsoft.Compute/virtualMachines",
                    "rg",
                    "eastus",
                )
            })
            .collect();
        let engine = SearchEngine::with_records(records);
        assert_eq!(suggestions(&engine, "node").len(), MAX_SUGGESTIONS);
    }
}
