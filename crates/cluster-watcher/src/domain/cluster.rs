//! Desired-vs-watched cluster set diff.

use std::collections::HashMap;
use std::collections::HashSet;

use api_types::ClusterRecord;
use tracing::warn;

/// Changes needed to bring the watched cluster set in line with the store.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClusterDiff {
    /// Clusters present in the store but not watched yet
    pub added: Vec<ClusterRecord>,
    /// Watched cluster ids that disappeared from the store
    pub removed: Vec<String>,
    /// Watched clusters whose `api_server` or `token` changed
    pub restarted: Vec<ClusterRecord>,
}

impl ClusterDiff {
    /// Diffs the desired set against the snapshots of currently watched clusters.
    ///
    /// `added` and `restarted` keep the store order, `removed` is sorted.
    pub fn compute<'a>(
        desired: Vec<ClusterRecord>,
        watching: impl IntoIterator<Item = &'a ClusterRecord>,
    ) -> Self {
        let desired = dedup_by_id(desired);
        let watching: HashMap<&str, &ClusterRecord> = watching
            .into_iter()
            .map(|record| (record.id.as_str(), record))
            .collect();

        let desired_ids: HashSet<&str> = desired.iter().map(|r| r.id.as_str()).collect();
        let mut removed: Vec<String> = watching
            .keys()
            .filter(|id| !desired_ids.contains(*id))
            .map(|id| id.to_string())
            .collect();
        removed.sort();

        let mut added = Vec::new();
        let mut restarted = Vec::new();
        for record in desired {
            match watching.get(record.id.as_str()) {
                None => added.push(record),
                Some(active) if !active.same_connectivity(&record) => restarted.push(record),
                Some(_) => {}
            }
        }

        Self {
            added,
            removed,
            restarted,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.restarted.is_empty()
    }
}

/// Drops duplicate ids; the last record wins but keeps the first position.
fn dedup_by_id(records: Vec<ClusterRecord>) -> Vec<ClusterRecord> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<ClusterRecord> = Vec::with_capacity(records.len());
    for record in records {
        match positions.get(&record.id) {
            Some(&idx) => {
                warn!(cluster_id = %record.id, "Duplicate cluster id in store, last record wins");
                unique[idx] = record;
            }
            None => {
                positions.insert(record.id.clone(), unique.len());
                unique.push(record);
            }
        }
    }
    unique
}
