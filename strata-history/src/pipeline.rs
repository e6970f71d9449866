//! Rows in, tagged snapshot out
//!
//! [`IngestPipeline`] chains normalization, snapshot building and the
//! store append for whole releases. Nothing here raises: every outcome is
//! collected into an [`IngestReport`].

use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{info, warn};

use strata_core::{Config, StrataError, StrataResult};
use strata_ingest::{NormalizedBatch, RawRow, RecordNormalizer, RowWarning, Severity};

use crate::builder::SnapshotBuilder;
use crate::snapshot::Snapshot;
use crate::store::{SnapshotStore, VersionTag};

/// Outcome of ingesting one release
#[derive(Debug)]
pub struct IngestReport {
    pub release_id: String,
    /// Tag assigned by the store; `None` when the release was rejected
    pub tag: Option<VersionTag>,
    pub rows_seen: usize,
    /// Records that made it into the snapshot
    pub records: usize,
    pub warnings: Vec<RowWarning>,
    pub unmapped_fields: BTreeSet<String>,
    /// Fatal problems that kept the release out of the history
    pub errors: Vec<StrataError>,
}

impl IngestReport {
    fn from_batch(batch: &NormalizedBatch) -> Self {
        Self {
            release_id: batch.release_id.clone(),
            tag: None,
            rows_seen: batch.rows_seen,
            records: 0,
            warnings: batch.warnings.clone(),
            unmapped_fields: batch.unmapped_fields.clone(),
            errors: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.tag.is_some()
    }

    pub fn skipped_rows(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| w.severity == Severity::Skipped)
            .count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestPipeline {
    normalizer: RecordNormalizer,
}

impl IngestPipeline {
    pub fn new(normalizer: RecordNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn from_config(config: &Config) -> StrataResult<Self> {
        Ok(Self::new(RecordNormalizer::from_config(&config.normalizer)?))
    }

    pub fn normalizer(&self) -> &RecordNormalizer {
        &self.normalizer
    }

    /// Normalize, build and append one release
    pub fn ingest(&self, store: &SnapshotStore, release_id: &str, rows: &[RawRow]) -> IngestReport {
        let (report, built) = self.prepare(release_id, rows);
        Self::publish(store, report, built)
    }

    /// Prepare several releases in parallel, then append them in the given order
    pub fn ingest_many(
        &self,
        store: &SnapshotStore,
        releases: &[(String, Vec<RawRow>)],
    ) -> Vec<IngestReport> {
        let prepared: Vec<_> = releases
            .par_iter()
            .map(|(release_id, rows)| self.prepare(release_id, rows))
            .collect();

        prepared
            .into_iter()
            .map(|(report, built)| Self::publish(store, report, built))
            .collect()
    }

    fn prepare(&self, release_id: &str, rows: &[RawRow]) -> (IngestReport, StrataResult<Snapshot>) {
        let batch = self.normalizer.normalize_batch(release_id, rows);
        let report = IngestReport::from_batch(&batch);
        let built = SnapshotBuilder::build(batch.release_id, batch.records);
        (report, built)
    }

    fn publish(
        store: &SnapshotStore,
        mut report: IngestReport,
        built: StrataResult<Snapshot>,
    ) -> IngestReport {
        let appended = built.and_then(|snapshot| {
            let count = snapshot.len();
            store.append(snapshot).map(|tag| (tag, count))
        });

        match appended {
            Ok((tag, count)) => {
                report.tag = Some(tag);
                report.records = count;
                info!(
                    "Ingested {} as {}: {} records from {} rows, {} warnings",
                    report.release_id,
                    tag,
                    count,
                    report.rows_seen,
                    report.warnings.len()
                );
            }
            Err(e) => {
                warn!("Release {} rejected: {}", report.release_id, e);
                report.errors.push(e);
            }
        }
        report
    }
}
