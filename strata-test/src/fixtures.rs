//! Test fixtures and data generators
//!
//! Lineages follow real ICTV placements so names in test output stay
//! recognisable.

use serde_json::Value;

use strata_core::{ClassificationPath, SpeciesRecord};
use strata_history::{Snapshot, SnapshotBuilder};
use strata_ingest::RawRow;

/// Lineage filled from the realm downwards
pub fn lineage(names: &[&str]) -> ClassificationPath {
    ClassificationPath::from_top(names.iter().copied())
}

/// Tailed-phage lineage down to `family`
pub fn phage_lineage(family: &str) -> ClassificationPath {
    lineage(&[
        "Duplodnaviria",
        "Heunggongvirae",
        "Uroviricota",
        "Caudoviricetes",
        "Caudovirales",
        family,
    ])
}

/// Coronavirus lineage down to `genus`
pub fn corona_lineage(genus: &str) -> ClassificationPath {
    lineage(&[
        "Riboviria",
        "Orthornavirae",
        "Pisuviricota",
        "Pisoniviricetes",
        "Nidovirales",
        "Coronaviridae",
        "Orthocoronavirinae",
        genus,
    ])
}

/// Tailed phage placed in `family`
pub fn record(name: &str, family: &str) -> SpeciesRecord {
    SpeciesRecord::new(name, phage_lineage(family))
}

/// Raw row from a JSON object literal
///
/// # Panics
/// If `value` is not a JSON object.
pub fn row(value: Value) -> RawRow {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        other => panic!("row fixture needs a JSON object, got {other}"),
    }
}

/// Build a snapshot, panicking on invariant violations
pub fn snapshot_of(version_id: &str, records: Vec<SpeciesRecord>) -> Snapshot {
    SnapshotBuilder::build(version_id, records)
        .unwrap_or_else(|e| panic!("fixture snapshot {version_id} is invalid: {e}"))
}

/// Deterministic release of `count` phages spread over `families`
pub fn generate_release(version_id: &str, count: usize, families: &[&str]) -> Snapshot {
    let records = (0..count)
        .map(|i| record(&format!("Escherichia phage {i:05}"), families[i % families.len()]))
        .collect();
    snapshot_of(version_id, records)
}
