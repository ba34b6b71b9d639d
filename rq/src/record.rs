//! Indexable resource record

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A resource as indexed by the search engine.
///
/// This is a flattened projection of a cloud resource: just the fields
/// queries can match against. `id` is globally unique and opaque;
/// `resource_type` is the dotted namespaced identifier
/// (e.g. `Microsoft.Compute/virtualMachines`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    pub resource_type: String,
    pub resource_group: String,
    pub location: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Record {
    /// Convenience constructor for untagged records
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        resource_type: impl Into<String>,
        resource_group: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resource_type: resource_type.into(),
            resource_group: resource_group.into(),
            location: location.into(),
            tags: BTreeMap::new(),
        }
    }

    /// Attach a tag, builder-style
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}
