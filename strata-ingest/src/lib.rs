//! Normalization of heterogeneous release tables into canonical records
//!
//! Ingestion collaborators hand over rows as loosely-typed maps whose headers
//! drift from release to release. This crate resolves those headers through
//! per-release [`AliasTable`]s and produces [`strata_core::SpeciesRecord`]s,
//! turning every bad row into a [`RowWarning`] instead of an error.

pub mod alias;
pub mod normalizer;

pub use alias::{normalize_header, AliasTable, CanonicalField};
pub use normalizer::{NormalizedBatch, RawRow, RecordNormalizer, RowOutcome, RowWarning, Severity};
