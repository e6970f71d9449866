//! Release history and explainable diffs for hierarchical taxonomies
//!
//! Normalized records become immutable [`Snapshot`]s, snapshots are appended
//! to a [`SnapshotStore`], and any two stored versions can be compared into a
//! [`strata_core::ChangeReport`] of additions, removals, renames,
//! reclassifications and restructure events.

// Snapshots
pub mod builder;
pub mod snapshot;

// Comparison
pub mod diff;

// History
pub mod lineage;
pub mod store;
pub mod traits;

// Ingestion
pub mod pipeline;

pub use builder::SnapshotBuilder;
pub use diff::{diff, DiffEngine};
pub use lineage::{species_history, SpeciesHistoryEntry};
pub use pipeline::{IngestPipeline, IngestReport};
pub use snapshot::{Snapshot, SnapshotStats};
pub use store::{
    FilesystemBackend, HistoryEntry, MemoryBackend, SnapshotBackend, SnapshotStore, VersionTag,
    LATEST,
};
pub use traits::TaxonomyHistory;
