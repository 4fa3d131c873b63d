//! Identifier classification between two snapshots.

use crate::snapshot::SnapshotSet;

/// Where each identifier of a model lives.
///
/// Every id of either snapshot appears in exactly one list. Lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    /// Ids present only in the source.
    pub only_in_source: Vec<String>,
    /// Ids present only in the target.
    pub only_in_target: Vec<String>,
    /// Ids present on both sides.
    pub in_both: Vec<String>,
}

impl Diff {
    /// Total number of distinct ids.
    pub fn total(&self) -> usize {
        self.only_in_source.len() + self.only_in_target.len() + self.in_both.len()
    }

    /// Returns true if neither snapshot had records.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Classifies the ids of two snapshots of the same model.
///
/// Linear in the size of both sets.
pub fn diff(source: &SnapshotSet, target: &SnapshotSet) -> Diff {
    let mut result = Diff::default();

    for id in source.sorted_ids() {
        if target.contains(id) {
            result.in_both.push(id.to_string());
        } else {
            result.only_in_source.push(id.to_string());
        }
    }
    for id in target.sorted_ids() {
        if !source.contains(id) {
            result.only_in_target.push(id.to_string());
        }
    }

    result
}
