//! Classification history of a single species across releases
//!
//! The history follows one entity rather than one string: consecutive
//! releases are diffed and `Renamed` links are followed forward and backward
//! from the first release that carries the requested name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use strata_core::{ClassificationPath, StrataResult};

use crate::store::{consecutive_reports, SnapshotStore, VersionTag};

/// Where an entity sat in one release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesHistoryEntry {
    pub tag: VersionTag,
    pub release_id: String,
    /// Scientific name in force in this release
    pub name: String,
    pub classification: ClassificationPath,
}

/// History of `name` in tag order; releases without the entity are omitted.
///
/// An empty list means no stored release ever used the name.
pub fn species_history(store: &SnapshotStore, name: &str) -> StrataResult<Vec<SpeciesHistoryEntry>> {
    let snapshots = store.snapshots();
    let Some(anchor) = snapshots.iter().position(|(_, s)| s.contains(name)) else {
        debug!("No stored release contains '{}'", name);
        return Ok(Vec::new());
    };

    let reports = consecutive_reports(store.engine(), &snapshots);
    let mut names_by_position: BTreeMap<usize, String> = BTreeMap::new();
    names_by_position.insert(anchor, name.to_string());

    let mut current = name.to_string();
    for next in anchor + 1..snapshots.len() {
        if !snapshots[next].1.contains(&current) {
            if let Some(renamed) = reports[next - 1].renamed_to(&current) {
                current = renamed.to_string();
            }
        }
        if snapshots[next].1.contains(&current) {
            names_by_position.insert(next, current.clone());
        }
    }

    let mut current = name.to_string();
    for previous in (0..anchor).rev() {
        if !snapshots[previous].1.contains(&current) {
            if let Some(original) = reports[previous].renamed_from(&current) {
                current = original.to_string();
            }
        }
        if snapshots[previous].1.contains(&current) {
            names_by_position.insert(previous, current.clone());
        }
    }

    let history = names_by_position
        .into_iter()
        .filter_map(|(i, species)| {
            let (entry, snapshot) = &snapshots[i];
            snapshot.get(&species).map(|record| SpeciesHistoryEntry {
                tag: entry.tag,
                release_id: entry.release_id.clone(),
                name: species.clone(),
                classification: record.classification.clone(),
            })
        })
        .collect::<Vec<_>>();

    debug!(
        "History of '{}' spans {} of {} releases",
        name,
        history.len(),
        snapshots.len()
    );
    Ok(history)
}
