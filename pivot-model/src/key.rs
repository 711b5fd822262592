//! FILENAME: pivot-model/src/key.rs
//! Id-combination keying for the sparse aggregation result.
//!
//! An aggregation value is addressed by the ordered tuple of dimension-item
//! ids that produced it: the column-axis ids first, then the row-axis ids.
//! The canonical map key joins the ids with a stable separator.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Separator joining dimension-item ids into a lookup key.
pub const ID_SEPARATOR: char = '-';

/// An ordered tuple of dimension-item ids addressing one aggregation value.
///
/// Most pivot layouts carry at most a handful of dimensions per axis, so the
/// ids are stored inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdCombination {
    ids: SmallVec<[String; 4]>,
}

impl IdCombination {
    pub fn new() -> Self {
        IdCombination { ids: SmallVec::new() }
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut combination = IdCombination::new();
        for id in ids {
            combination.add(id);
        }
        combination
    }

    /// Appends one id segment. Empty segments are skipped, which is how an
    /// absent axis contributes nothing to the key.
    pub fn add(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !id.is_empty() {
            self.ids.push(id);
        }
    }

    /// Appends every id of `other`.
    pub fn extend_from(&mut self, other: &IdCombination) {
        for id in &other.ids {
            self.ids.push(id.clone());
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// Returns the first id that also appears in `candidates`. Used to pick
    /// the id belonging to a particular dimension out of the combination.
    pub fn id_from<'a>(&'a self, candidates: &[String]) -> Option<&'a str> {
        self.ids
            .iter()
            .find(|id| candidates.iter().any(|c| c == *id))
            .map(|id| id.as_str())
    }

    /// Canonical map key: the ids joined by [`ID_SEPARATOR`].
    pub fn key(&self) -> String {
        let mut key = String::new();
        for (i, id) in self.ids.iter().enumerate() {
            if i > 0 {
                key.push(ID_SEPARATOR);
            }
            key.push_str(id);
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_joins_ids_in_order() {
        let combination = IdCombination::from_ids(["de1", "pe1", "ou1"]);
        assert_eq!(combination.key(), "de1-pe1-ou1");
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        let mut combination = IdCombination::new();
        combination.add("");
        combination.add("de1");
        combination.add("");
        assert_eq!(combination.len(), 1);
        assert_eq!(combination.key(), "de1");
    }

    #[test]
    fn test_extend_from() {
        let mut combination = IdCombination::from_ids(["c1"]);
        combination.extend_from(&IdCombination::from_ids(["r1", "r2"]));
        assert_eq!(combination.key(), "c1-r1-r2");
    }

    #[test]
    fn test_id_from_candidates() {
        let combination = IdCombination::from_ids(["de1", "pe1"]);
        let periods = vec!["pe1".to_string(), "pe2".to_string()];
        assert_eq!(combination.id_from(&periods), Some("pe1"));
        assert_eq!(combination.id_from(&[]), None);
    }
}
