//! Immutable per-release snapshots
//!
//! A [`Snapshot`] owns every [`SpeciesRecord`] of one release, keyed by
//! scientific name in ingestion order, plus eagerly computed rank
//! populations. Snapshots are only created by
//! [`SnapshotBuilder`](crate::builder::SnapshotBuilder) and are never
//! mutated afterwards; the store shares them as `Arc<Snapshot>`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use strata_core::{SpeciesRecord, StrataError, TaxonRank};

use crate::builder::SnapshotBuilder;

/// Species populations per rank value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    species_count: usize,
    populations: HashMap<TaxonRank, HashMap<String, usize>>,
}

impl SnapshotStats {
    pub(crate) fn from_records<'a>(records: impl Iterator<Item = &'a SpeciesRecord>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.species_count += 1;
            for (rank, name) in record.classification.iter() {
                *stats
                    .populations
                    .entry(rank)
                    .or_default()
                    .entry(name.to_string())
                    .or_insert(0) += 1;
            }
        }
        stats
    }

    pub fn species_count(&self) -> usize {
        self.species_count
    }

    /// Number of species classified under `value` at `rank`
    pub fn population(&self, rank: TaxonRank, value: &str) -> usize {
        self.populations
            .get(&rank)
            .and_then(|values| values.get(value))
            .copied()
            .unwrap_or(0)
    }

    /// Distinct taxa populated at `rank`
    pub fn distinct(&self, rank: TaxonRank) -> usize {
        self.populations.get(&rank).map_or(0, HashMap::len)
    }

    pub fn values_at(&self, rank: TaxonRank) -> Option<&HashMap<String, usize>> {
        self.populations.get(&rank)
    }

    pub fn family_counts(&self) -> Option<&HashMap<String, usize>> {
        self.values_at(TaxonRank::Family)
    }

    pub fn order_counts(&self) -> Option<&HashMap<String, usize>> {
        self.values_at(TaxonRank::Order)
    }
}

/// One release of the taxonomy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotData", into = "SnapshotData")]
pub struct Snapshot {
    version_id: String,
    records: IndexMap<String, SpeciesRecord>,
    stats: SnapshotStats,
}

/// On-disk shape: populations are derived, so only records are kept
#[derive(Serialize, Deserialize)]
struct SnapshotData {
    version_id: String,
    records: Vec<SpeciesRecord>,
}

impl TryFrom<SnapshotData> for Snapshot {
    type Error = StrataError;

    fn try_from(data: SnapshotData) -> Result<Self, Self::Error> {
        SnapshotBuilder::build(data.version_id, data.records)
    }
}

impl From<Snapshot> for SnapshotData {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            version_id: snapshot.version_id,
            records: snapshot.records.into_values().collect(),
        }
    }
}

impl Snapshot {
    /// Records must already be validated and unique by name
    pub(crate) fn from_parts(version_id: String, records: IndexMap<String, SpeciesRecord>) -> Self {
        let stats = SnapshotStats::from_records(records.values());
        Self {
            version_id,
            records,
            stats,
        }
    }

    /// Release identifier the snapshot was built with
    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SpeciesRecord> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Records in ingestion order
    pub fn records(&self) -> impl Iterator<Item = &SpeciesRecord> {
        self.records.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn stats(&self) -> &SnapshotStats {
        &self.stats
    }

    /// Species whose lineage places them under `value` at `rank`
    pub fn species_in(&self, rank: TaxonRank, value: &str) -> Vec<&SpeciesRecord> {
        self.records
            .values()
            .filter(|record| record.classification.get(rank) == Some(value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::ClassificationPath;

    fn phage(name: &str, family: &str) -> SpeciesRecord {
        SpeciesRecord::new(
            name,
            ClassificationPath::from_top([
                "Duplodnaviria",
                "Heunggongvirae",
                "Uroviricota",
                "Caudoviricetes",
                "Caudovirales",
                family,
            ]),
        )
    }

    fn sample() -> Snapshot {
        SnapshotBuilder::build(
            "MSL35",
            vec![
                phage("Phage Lambda", "Siphoviridae"),
                phage("Phage T5", "Siphoviridae"),
                phage("Phage T4", "Myoviridae"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_populations_are_precomputed() {
        let snapshot = sample();
        let stats = snapshot.stats();

        assert_eq!(stats.species_count(), 3);
        assert_eq!(stats.population(TaxonRank::Family, "Siphoviridae"), 2);
        assert_eq!(stats.population(TaxonRank::Family, "Myoviridae"), 1);
        assert_eq!(stats.population(TaxonRank::Order, "Caudovirales"), 3);
        assert_eq!(stats.population(TaxonRank::Family, "Podoviridae"), 0);
        assert_eq!(stats.distinct(TaxonRank::Family), 2);
        assert_eq!(stats.distinct(TaxonRank::Genus), 0);
        assert_eq!(stats.order_counts().map(|m| m.len()), Some(1));
        assert!(stats.family_counts().is_some());
    }

    #[test]
    fn test_lookup_and_order() {
        let snapshot = sample();
        assert_eq!(snapshot.version_id(), "MSL35");
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.contains("Phage T4"));
        assert!(!snapshot.contains("phage t4"));
        assert_eq!(
            snapshot.names().collect::<Vec<_>>(),
            vec!["Phage Lambda", "Phage T5", "Phage T4"]
        );
        assert_eq!(snapshot.species_in(TaxonRank::Family, "Siphoviridae").len(), 2);
    }

    #[test]
    fn test_serde_keeps_records_and_rebuilds_stats() {
        let snapshot = sample();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("populations"));

        let restored: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);
        assert_eq!(restored.stats().population(TaxonRank::Family, "Siphoviridae"), 2);
    }

    #[test]
    fn test_deserializing_duplicate_names_fails() {
        let json = r#"{"version_id":"x","records":[
            {"scientific_name":"A","classification":{}},
            {"scientific_name":"A","classification":{}}
        ]}"#;
        assert!(serde_json::from_str::<Snapshot>(json).is_err());
    }
}
