//! Model-facing tool names.
//!
//! Function names offered to the model may only contain `[A-Za-z0-9_-]`, so
//! canonical ids such as `reports.summary` are mapped to `reports_summary`
//! and resolved back when the model calls them.

use std::collections::{BTreeMap, HashSet};

/// Model-safe name for a canonical id, unique within `used`.
pub fn safe_tool_name(full_name: &str, used: &HashSet<String>) -> String {
    let mut base: String = full_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if base.is_empty() {
        base = "tool".to_string();
    }

    let mut candidate = base.clone();
    let mut suffix = 1;
    while used.contains(&candidate) {
        suffix += 1;
        candidate = format!("{base}_{suffix}");
    }
    candidate
}

/// Bidirectional map between safe names and canonical tool ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolNameMap {
    by_name: BTreeMap<String, String>,
    by_id: BTreeMap<String, String>,
}

impl ToolNameMap {
    /// Assigns safe names to ids in the given order.
    pub fn build<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut map = Self::default();
        let mut used = HashSet::new();
        for id in ids {
            if map.by_id.contains_key(id) {
                continue;
            }
            let name = safe_tool_name(id, &used);
            used.insert(name.clone());
            map.by_name.insert(name.clone(), id.to_string());
            map.by_id.insert(id.to_string(), name);
        }
        map
    }

    /// Canonical id for a safe name, or for a canonical id used as an alias.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .map(String::as_str)
            .or_else(|| self.by_id.get_key_value(name).map(|(id, _)| id.as_str()))
    }

    pub fn safe_name(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    /// Safe names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
