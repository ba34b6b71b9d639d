//! Dynamic property flattening
//!
//! The cloud CLI returns arbitrary JSON shapes. They are modeled as the
//! scalar/sequence/mapping sum that `serde_json::Value` already is and
//! flattened into indented lines for the details pane. Long scalar values
//! are truncated with a trailing ellipsis unless their path is in the
//! disclosure set.

use std::collections::HashSet;

use serde_json::Value;

/// Values longer than this are truncated unless expanded
pub const TRUNCATE_AT: usize = 60;

/// One renderable property line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropLine {
    pub depth: usize,
    pub key: String,
    /// Dotted path keying the disclosure state, e.g. `properties.osProfile.computerName`
    pub path: String,
    /// None for container headers (mappings / sequences)
    pub value: Option<String>,
    /// True when the full value is longer than what is shown
    pub truncated: bool,
    /// True when pressing the expansion key would change rendering
    pub expandable: bool,
}

/// Flatten a JSON document into display lines, honoring the disclosure set
pub fn flatten(value: &Value, expanded: &HashSet<String>) -> Vec<PropLine> {
    let mut lines = Vec::new();
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                walk(key, child, key.clone(), 0, expanded, &mut lines);
            }
        }
        other => walk("value", other, "value".to_string(), 0, expanded, &mut lines),
    }
    lines
}

fn walk(key: &str, value: &Value, path: String, depth: usize, expanded: &HashSet<String>, out: &mut Vec<PropLine>) {
    match value {
        Value::Object(map) => {
            out.push(PropLine {
                depth,
                key: key.to_string(),
                path: path.clone(),
                value: None,
                truncated: false,
                expandable: false,
            });
            for (child_key, child) in map {
                let child_path = format!("{}.{}", path, child_key);
                walk(child_key, child, child_path, depth + 1, expanded, out);
            }
        }
        Value::Array(items) => {
            out.push(PropLine {
                depth,
                key: format!("{} [{}]", key, items.len()),
                path: path.clone(),
                value: None,
                truncated: false,
                expandable: false,
            });
            for (i, child) in items.iter().enumerate() {
                let child_path = format!("{}[{}]", path, i);
                walk(&format!("[{}]", i), child, child_path, depth + 1, expanded, out);
            }
        }
        scalar => {
            let raw = scalar_text(scalar);
            let show_full = expanded.contains(&path);
            let too_long = raw.chars().count() > TRUNCATE_AT;
            let text = if too_long && !show_full {
                let cut: String = raw.chars().take(TRUNCATE_AT).collect();
                format!("{}…", cut)
            } else {
                raw
            };
            out.push(PropLine {
                depth,
                key: key.to_string(),
                path,
                value: Some(text),
                truncated: too_long && !show_full,
                expandable: too_long,
            });
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_mapping() {
        let value = json!({"a": {"b": 1, "c": "x"}});
        let lines = flatten(&value, &HashSet::new());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].key, "a");
        assert_eq!(lines[1].path, "a.b");
        assert_eq!(lines[1].value.as_deref(), Some("1"));
        assert_eq!(lines[2].depth, 1);
    }

    #[test]
    fn test_flatten_sequence_indices() {
        let value = json!({"zones": ["1", "2"]});
        let lines = flatten(&value, &HashSet::new());
        assert_eq!(lines[0].key, "zones [2]");
        assert_eq!(lines[1].path, "zones[0]");
        assert_eq!(lines[2].value.as_deref(), Some("2"));
    }

    #[test]
    fn test_long_value_truncates_with_ellipsis() {
        let long = "x".repeat(100);
        let value = json!({"blob": long});
        let lines = flatten(&value, &HashSet::new());
        let line = &lines[0];
        assert!(line.truncated);
        assert!(line.expandable);
        let shown = line.value.as_deref().unwrap();
        assert!(shown.ends_with('…'));
        assert_eq!(shown.chars().count(), TRUNCATE_AT + 1);
    }

    #[test]
    fn test_expanded_path_shows_full_value() {
        let long = "x".repeat(100);
        let value = json!({"blob": long.clone()});
        let mut expanded = HashSet::new();
        expanded.insert("blob".to_string());
        let lines = flatten(&value, &expanded);
        assert_eq!(lines[0].value.as_deref(), Some(long.as_str()));
        assert!(!lines[0].truncated);
        assert!(lines[0].expandable);
    }

    #[test]
    fn test_short_value_not_expandable() {
        let value = json!({"name": "vm1"});
        let lines = flatten(&value, &HashSet::new());
        assert!(!lines[0].expandable);
        assert!(!lines[0].truncated);
    }
}
