//! FILENAME: pivot-model/src/response.rs
//! The aggregation result consumed by the rendering engine.
//!
//! The result is a sparse map from id-combination keys to raw values, plus
//! the metadata needed for display: item names, optional hierarchy names,
//! and per-item legend-set membership. Raw values arrive as strings; parsing
//! is lenient - a partially renderable grid beats a blocked one.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::key::IdCombination;

/// A sparse multi-dimensional aggregation result with display metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationResponse {
    /// Id-combination key -> raw value.
    id_value_map: FxHashMap<String, String>,

    /// Item id -> display name.
    names: FxHashMap<String, String>,

    /// Item id -> hierarchy display name (ancestor path included).
    hierarchy_names: FxHashMap<String, String>,

    /// Item id -> legend set id, for by-data-item legend coloring.
    item_legend_sets: FxHashMap<String, String>,
}

impl AggregationResponse {
    pub fn new() -> Self {
        AggregationResponse::default()
    }

    pub fn set_value(&mut self, ids: &IdCombination, raw: impl Into<String>) {
        self.id_value_map.insert(ids.key(), raw.into());
    }

    /// Publishes a value under a precomputed key. Used to seed derived
    /// entries such as per-row totals for sortable column headers.
    pub fn seed_value(&mut self, key: impl Into<String>, value: f64) {
        self.id_value_map.insert(key.into(), format!("{}", value));
    }

    pub fn remove_value(&mut self, key: &str) {
        self.id_value_map.remove(key);
    }

    /// Raw value for a key, if the combination exists in the result.
    pub fn raw_value(&self, key: &str) -> Option<&str> {
        self.id_value_map.get(key).map(|v| v.as_str())
    }

    pub fn set_name(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(id.into(), name.into());
    }

    pub fn set_hierarchy_name(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.hierarchy_names.insert(id.into(), name.into());
    }

    pub fn set_item_legend_set(&mut self, id: impl Into<String>, legend_set: impl Into<String>) {
        self.item_legend_sets.insert(id.into(), legend_set.into());
    }

    /// Display name for an id; missing names degrade to the empty string.
    pub fn get_name_by_id(&self, id: &str) -> &str {
        self.names.get(id).map(|n| n.as_str()).unwrap_or("")
    }

    /// Display name for an item, preferring the hierarchy name when hierarchy
    /// display is enabled and the response carries one.
    pub fn get_item_name(&self, id: &str, show_hierarchy: bool) -> &str {
        if show_hierarchy {
            if let Some(name) = self.hierarchy_names.get(id) {
                return name;
            }
        }
        self.get_name_by_id(id)
    }

    /// Legend set id configured for an item, if any.
    pub fn legend_set_for_item(&self, id: &str) -> Option<&str> {
        self.item_legend_sets.get(id).map(|s| s.as_str())
    }
}

/// Parses a raw response value. Booleans count as 1, strict numbers parse as
/// themselves, anything else is 0.
pub fn parse_value(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
        return 1.0;
    }
    trimmed.parse::<f64>().unwrap_or(0.0)
}
