/// Query surface offered to downstream collaborators
///
/// Reports, viewers and exporters talk to the history through this trait
/// only, so they can be handed a [`SnapshotStore`] or a test double.
use std::sync::Arc;

use strata_core::{ChangeReport, StrataResult};

use crate::lineage::{species_history, SpeciesHistoryEntry};
use crate::snapshot::Snapshot;
use crate::store::{SnapshotStore, VersionTag};

pub trait TaxonomyHistory: Send + Sync {
    /// Snapshot for a tag, a release id or `latest`
    fn get_snapshot(&self, version: &str) -> StrataResult<Arc<Snapshot>>;

    /// Explainable changes from `version_a` to `version_b`
    fn diff(&self, version_a: &str, version_b: &str) -> StrataResult<ChangeReport>;

    /// Classification of one entity across releases, following renames
    fn get_species_history(&self, name: &str) -> StrataResult<Vec<SpeciesHistoryEntry>>;

    /// Tags in append order
    fn list_versions(&self) -> Vec<VersionTag>;
}

impl TaxonomyHistory for SnapshotStore {
    fn get_snapshot(&self, version: &str) -> StrataResult<Arc<Snapshot>> {
        self.get(version)
    }

    fn diff(&self, version_a: &str, version_b: &str) -> StrataResult<ChangeReport> {
        SnapshotStore::diff(self, version_a, version_b)
    }

    fn get_species_history(&self, name: &str) -> StrataResult<Vec<SpeciesHistoryEntry>> {
        species_history(self, name)
    }

    fn list_versions(&self) -> Vec<VersionTag> {
        self.history()
    }
}
