//! Row normalization into canonical species records

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

use strata_core::{
    ClassificationPath, MalformedRecord, NormalizerConfig, SpeciesAttributes, SpeciesRecord,
    StrataResult,
};

use crate::alias::{AliasTable, CanonicalField};

/// One input row as handed over by the ingestion collaborator
pub type RawRow = BTreeMap<String, Value>;

/// Batches smaller than this are normalized on the calling thread
const PARALLEL_THRESHOLD: usize = 2048;

/// Whether the row survived the problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The row was dropped from the batch
    Skipped,
    /// The row was kept with the offending value discarded
    Recovered,
}

/// A problem found in one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowWarning {
    /// Zero-based position of the row in the batch
    pub row: usize,
    pub severity: Severity,
    pub reason: MalformedRecord,
}

impl RowWarning {
    fn skipped(row: usize, reason: MalformedRecord) -> Self {
        Self {
            row,
            severity: Severity::Skipped,
            reason,
        }
    }

    fn recovered(row: usize, reason: MalformedRecord) -> Self {
        Self {
            row,
            severity: Severity::Recovered,
            reason,
        }
    }
}

/// Result of normalizing a single row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Record {
        record: SpeciesRecord,
        warnings: Vec<RowWarning>,
    },
    Skipped(RowWarning),
}

/// Normalized rows of one release plus everything that went wrong
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    pub release_id: String,
    pub records: Vec<SpeciesRecord>,
    pub warnings: Vec<RowWarning>,
    /// Headers that matched neither an alias nor an ignore entry
    pub unmapped_fields: BTreeSet<String>,
    pub rows_seen: usize,
}

impl NormalizedBatch {
    pub fn skipped_count(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| w.severity == Severity::Skipped)
            .count()
    }
}

/// Maps heterogeneous rows onto [`SpeciesRecord`]s.
///
/// Each release may carry its own alias table; releases without one use the
/// default table.
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    default_table: AliasTable,
    release_tables: HashMap<String, AliasTable>,
    null_markers: HashSet<String>,
}

impl Default for RecordNormalizer {
    fn default() -> Self {
        Self::new(AliasTable::standard())
    }
}

impl RecordNormalizer {
    pub fn new(default_table: AliasTable) -> Self {
        Self {
            default_table,
            release_tables: HashMap::new(),
            null_markers: NormalizerConfig::default()
                .null_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
        }
    }

    /// Standard aliases extended with the configured extras
    pub fn from_config(config: &NormalizerConfig) -> StrataResult<Self> {
        let mut table = AliasTable::standard();
        table.extend_from_config(&config.extra_aliases)?;

        let mut normalizer = Self::new(table);
        normalizer.null_markers = config
            .null_markers
            .iter()
            .map(|m| m.trim().to_lowercase())
            .collect();
        Ok(normalizer)
    }

    /// Use `table` instead of the default for rows of `release_id`
    pub fn with_release_table(mut self, release_id: impl Into<String>, table: AliasTable) -> Self {
        self.release_tables.insert(release_id.into(), table);
        self
    }

    pub fn table_for(&self, release_id: &str) -> &AliasTable {
        self.release_tables
            .get(release_id)
            .unwrap_or(&self.default_table)
    }

    /// Normalize every row of one release. Never fails; problems become warnings.
    pub fn normalize_batch(&self, release_id: &str, rows: &[RawRow]) -> NormalizedBatch {
        let table = self.table_for(release_id);

        let outcomes: Vec<RowOutcome> = if rows.len() >= PARALLEL_THRESHOLD {
            rows.par_iter()
                .enumerate()
                .map(|(index, row)| self.normalize_with(table, index, row))
                .collect()
        } else {
            rows.iter()
                .enumerate()
                .map(|(index, row)| self.normalize_with(table, index, row))
                .collect()
        };

        let mut records = Vec::with_capacity(rows.len());
        let mut warnings = Vec::new();
        for outcome in outcomes {
            match outcome {
                RowOutcome::Record {
                    record,
                    warnings: row_warnings,
                } => {
                    records.push(record);
                    warnings.extend(row_warnings);
                }
                RowOutcome::Skipped(warning) => {
                    debug!(row = warning.row, reason = %warning.reason, "Skipping row");
                    warnings.push(warning);
                }
            }
        }

        let unmapped_fields: BTreeSet<String> = rows
            .iter()
            .flat_map(|row| row.keys())
            .filter(|header| table.resolve(header).is_none() && !table.is_ignored(header))
            .cloned()
            .collect();

        let batch = NormalizedBatch {
            release_id: release_id.to_string(),
            records,
            warnings,
            unmapped_fields,
            rows_seen: rows.len(),
        };

        if batch.skipped_count() > 0 {
            warn!(
                release = release_id,
                skipped = batch.skipped_count(),
                rows = batch.rows_seen,
                "Rows skipped during normalization"
            );
        }
        if !batch.unmapped_fields.is_empty() {
            warn!(release = release_id, fields = ?batch.unmapped_fields, "Unmapped input fields");
        }
        info!(
            release = release_id,
            records = batch.records.len(),
            warnings = batch.warnings.len(),
            "Normalized release"
        );

        batch
    }

    /// Normalize a single row of `release_id`
    pub fn normalize_row(&self, release_id: &str, index: usize, row: &RawRow) -> RowOutcome {
        self.normalize_with(self.table_for(release_id), index, row)
    }

    fn normalize_with(&self, table: &AliasTable, index: usize, row: &RawRow) -> RowOutcome {
        let mut warnings = Vec::new();
        let mut fields: BTreeMap<CanonicalField, String> = BTreeMap::new();

        for (header, raw) in row {
            let Some(field) = table.resolve(header) else {
                continue;
            };

            let value = match self.clean_value(raw) {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(found) => {
                    let reason = MalformedRecord::InvalidValue {
                        field: header.clone(),
                        found: found.to_string(),
                    };
                    if field == CanonicalField::Species {
                        return RowOutcome::Skipped(RowWarning::skipped(index, reason));
                    }
                    warnings.push(RowWarning::recovered(index, reason));
                    continue;
                }
            };

            match fields.get(&field) {
                None => {
                    fields.insert(field, value);
                }
                Some(kept) if *kept == value => {}
                Some(kept) => warnings.push(RowWarning::recovered(
                    index,
                    MalformedRecord::ConflictingValues {
                        field: field.to_string(),
                        kept: kept.clone(),
                        ignored: value,
                    },
                )),
            }
        }

        let Some(name) = fields.remove(&CanonicalField::Species) else {
            return RowOutcome::Skipped(RowWarning::skipped(index, MalformedRecord::MissingSpecies));
        };

        let mut classification = ClassificationPath::new();
        let mut attributes = SpeciesAttributes::default();
        for (field, value) in fields {
            match field {
                CanonicalField::Rank(rank) => {
                    classification.insert(rank, value);
                }
                CanonicalField::GenomeComposition => attributes.genome_composition = Some(value),
                CanonicalField::Host => attributes.host = Some(value),
                CanonicalField::ProposalId => attributes.proposal_id = Some(value),
                CanonicalField::Species => {}
            }
        }

        if let Err(violation) = classification.validate() {
            return RowOutcome::Skipped(RowWarning::skipped(
                index,
                MalformedRecord::InvalidLineage { violation },
            ));
        }

        RowOutcome::Record {
            record: SpeciesRecord::new(name, classification).with_attributes(attributes),
            warnings,
        }
    }

    /// Trimmed text, `None` for absent values, or the JSON type name of an unusable value
    fn clean_value(&self, raw: &Value) -> Result<Option<String>, &'static str> {
        let text = match raw {
            Value::Null => return Ok(None),
            Value::String(s) => s.split_whitespace().collect::<Vec<_>>().join(" "),
            Value::Number(n) => n.to_string(),
            Value::Bool(_) => return Err("boolean"),
            Value::Array(_) => return Err("array"),
            Value::Object(_) => return Err("object"),
        };

        if self.null_markers.contains(&text.to_lowercase()) || text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}
