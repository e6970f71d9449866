/// Snapshot construction from normalized records
///
/// Building is where the hard invariants live: a release never contains the
/// same scientific name twice, and every lineage is gap-free. Either failure
/// rejects the whole release.
use indexmap::map::Entry;
use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info};

use strata_core::{MalformedRecord, SpeciesRecord, StrataError, StrataResult};

use crate::snapshot::Snapshot;

pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Validate `records` and freeze them into a [`Snapshot`]
    pub fn build<I>(version_id: impl Into<String>, records: I) -> StrataResult<Snapshot>
    where
        I: IntoIterator<Item = SpeciesRecord>,
    {
        let version_id = version_id.into();
        let mut index: IndexMap<String, SpeciesRecord> = IndexMap::new();

        for (row, record) in records.into_iter().enumerate() {
            if record.scientific_name.trim().is_empty() {
                return Err(StrataError::MalformedRecord {
                    row,
                    reason: MalformedRecord::MissingSpecies,
                });
            }

            if let Err(violation) = record.validate() {
                return Err(StrataError::InvariantViolation {
                    species: record.scientific_name,
                    violation,
                });
            }

            match index.entry(record.scientific_name.clone()) {
                Entry::Occupied(entry) => {
                    return Err(StrataError::DuplicateSpecies {
                        release: version_id,
                        name: entry.key().clone(),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(record);
                }
            }
        }

        let snapshot = Snapshot::from_parts(version_id, index);
        debug!(
            "Built snapshot {} with {} species",
            snapshot.version_id(),
            snapshot.len()
        );
        Ok(snapshot)
    }

    /// Build several independent releases in parallel, preserving input order
    pub fn build_many(releases: Vec<(String, Vec<SpeciesRecord>)>) -> Vec<StrataResult<Snapshot>> {
        let count = releases.len();
        let results: Vec<_> = releases
            .into_par_iter()
            .map(|(version_id, records)| Self::build(version_id, records))
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!("Built {} snapshots ({} failed)", count - failed, failed);
        results
    }
}
