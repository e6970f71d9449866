//! Explainable comparison of two snapshots
//!
//! [`DiffEngine::diff`] runs a fixed pipeline: exact set operations on the
//! names, rank-by-rank reclassification of the common names, fuzzy rename
//! pairing of what is left over, then clustering of mass reclassifications
//! into restructure events. Each step consumes what the previous one left,
//! so every name of either snapshot lands in exactly one category.

pub mod rename;
pub mod restructure;
pub mod similarity;

pub use rename::{match_renames, RenameMatches};
pub use restructure::cluster_restructures;
pub use similarity::{name_similarity, rename_score};

use rayon::prelude::*;
use tracing::{debug, info};

use strata_core::{
    ChangeReport, DiffConfig, Reclassification, SpeciesChange, SpeciesRecord, StrataResult,
};

use crate::snapshot::Snapshot;

/// Computes [`ChangeReport`]s with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    config: DiffConfig,
}

impl DiffEngine {
    pub fn new(config: DiffConfig) -> Self {
        Self { config }
    }

    /// Like [`DiffEngine::new`] but rejects out-of-range settings
    pub fn try_new(config: DiffConfig) -> StrataResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Compare `before` against `after`
    pub fn diff(&self, before: &Snapshot, after: &Snapshot) -> ChangeReport {
        let mut report = ChangeReport::empty(before.version_id(), after.version_id());

        // Exact set operations
        let mut removed: Vec<&SpeciesRecord> =
            before.records().filter(|r| !after.contains(r.name())).collect();
        let mut added: Vec<&SpeciesRecord> =
            after.records().filter(|r| !before.contains(r.name())).collect();
        removed.sort_by(|a, b| a.scientific_name.cmp(&b.scientific_name));
        added.sort_by(|a, b| a.scientific_name.cmp(&b.scientific_name));

        // Reclassification of common names
        let common: Vec<(&SpeciesRecord, &SpeciesRecord)> = before
            .records()
            .filter_map(|old| after.get(old.name()).map(|new| (old, new)))
            .collect();
        let mut reclassified: Vec<Reclassification> = common
            .par_iter()
            .filter_map(|(old, new)| {
                let changed_ranks = old.classification.differences(&new.classification);
                (!changed_ranks.is_empty()).then(|| Reclassification {
                    species: old.scientific_name.clone(),
                    changed_ranks,
                })
            })
            .collect();
        reclassified.sort_by(|a, b| a.species.cmp(&b.species));
        report.unchanged = common.len() - reclassified.len();

        debug!(
            "Diff {} -> {}: {} removed, {} added, {} common, {} reclassified",
            before.version_id(),
            after.version_id(),
            removed.len(),
            added.len(),
            common.len(),
            reclassified.len()
        );

        // Rename pairing on the leftovers
        let matches = match_renames(removed, added, &self.config);
        report.renamed = matches.renames;
        report.removed = matches.removed.into_iter().map(species_change).collect();
        report.added = matches.added.into_iter().map(species_change).collect();

        // Restructure clustering
        let (reclassified, restructured) =
            cluster_restructures(reclassified, before, after, &self.config);
        report.reclassified = reclassified;
        report.restructured = restructured;

        let summary = report.summary();
        info!(
            "Diff {} -> {}: +{} -{} ~{} renamed, {} reclassified, {} restructure events ({} species), {} unchanged",
            report.from_version,
            report.to_version,
            summary.added,
            summary.removed,
            summary.renamed,
            summary.reclassified,
            summary.restructure_events,
            summary.restructured_species,
            summary.unchanged
        );

        report
    }
}

fn species_change(record: &SpeciesRecord) -> SpeciesChange {
    SpeciesChange {
        species: record.scientific_name.clone(),
        classification: record.classification.clone(),
    }
}

/// One-shot comparison without keeping an engine around
pub fn diff(before: &Snapshot, after: &Snapshot, config: &DiffConfig) -> ChangeReport {
    DiffEngine::new(config.clone()).diff(before, after)
}
