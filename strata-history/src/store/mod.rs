//! Append-only release history
//!
//! [`SnapshotStore`] assigns tags (`v1`, `v2`, ...) in append order and
//! answers lookups by tag, by release id or by the `latest` alias. Appends
//! are serialized; lookups and diffs only hold the read lock long enough to
//! clone the `Arc<Snapshot>`s they need, so they never wait on a diff or on
//! backend I/O.

pub mod backend;

pub use backend::{FilesystemBackend, MemoryBackend, SnapshotBackend};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use strata_core::{strata_store_dir, ChangeReport, Config, DiffConfig, StrataError, StrataResult};

use crate::diff::DiffEngine;
use crate::snapshot::Snapshot;

/// Alias accepted wherever a version reference is
pub const LATEST: &str = "latest";

/// Position of a snapshot in the history, rendered as `v<n>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionTag(usize);

impl VersionTag {
    /// Tags start at `v1`
    pub fn from_sequence(sequence: usize) -> Self {
        Self(sequence.max(1))
    }

    pub fn sequence(&self) -> usize {
        self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl FromStr for VersionTag {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('v')
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .map(Self)
            .ok_or_else(|| StrataError::UnknownVersion(s.to_string()))
    }
}

impl TryFrom<String> for VersionTag {
    type Error = StrataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionTag> for String {
    fn from(tag: VersionTag) -> Self {
        tag.to_string()
    }
}

/// Metadata recorded for every appended snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub tag: VersionTag,
    pub release_id: String,
    pub species_count: usize,
    pub appended_at: DateTime<Utc>,
}

/// Release ids must not collide with the reference syntax, or lookups
/// would resolve them to a different snapshot
fn validate_release_id(release_id: &str) -> StrataResult<()> {
    let reject = |reason: &str| {
        Err(StrataError::InvalidReleaseId {
            release: release_id.to_string(),
            reason: reason.to_string(),
        })
    };

    if release_id.trim().is_empty() {
        return reject("release id is empty");
    }
    if release_id.eq_ignore_ascii_case(LATEST) {
        return reject("reserved for the latest version");
    }
    let tag_like = release_id
        .strip_prefix(['v', 'V'])
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));
    if tag_like {
        return reject("looks like a version tag");
    }
    Ok(())
}

#[derive(Default)]
struct History {
    entries: Vec<(HistoryEntry, Arc<Snapshot>)>,
    by_release: HashMap<String, usize>,
}

impl History {
    fn position(&self, reference: &str) -> Option<usize> {
        if reference == LATEST {
            return self.entries.len().checked_sub(1);
        }
        if let Ok(tag) = reference.parse::<VersionTag>() {
            if tag.sequence() <= self.entries.len() {
                return Some(tag.sequence() - 1);
            }
        }
        self.by_release.get(reference).copied()
    }

    fn resolve(&self, reference: &str) -> StrataResult<(VersionTag, Arc<Snapshot>)> {
        self.position(reference)
            .map(|i| (self.entries[i].0.tag, Arc::clone(&self.entries[i].1)))
            .ok_or_else(|| StrataError::UnknownVersion(reference.to_string()))
    }

    fn push(&mut self, entry: HistoryEntry, snapshot: Arc<Snapshot>) {
        self.by_release
            .insert(entry.release_id.clone(), self.entries.len());
        self.entries.push((entry, snapshot));
    }
}

/// Ordered, append-only collection of snapshots
pub struct SnapshotStore {
    history: RwLock<History>,
    append_lock: Mutex<()>,
    backend: Box<dyn SnapshotBackend>,
    engine: DiffEngine,
}

impl SnapshotStore {
    /// A store that keeps everything in memory
    pub fn in_memory(config: DiffConfig) -> StrataResult<Self> {
        Self::open(Box::new(MemoryBackend), config)
    }

    /// Open a store over `backend`, replaying whatever it has persisted
    pub fn open(backend: Box<dyn SnapshotBackend>, config: DiffConfig) -> StrataResult<Self> {
        let engine = DiffEngine::try_new(config)?;
        let mut history = History::default();

        for (entry, snapshot) in backend.load_all()? {
            validate_release_id(&entry.release_id)?;
            if entry.release_id != snapshot.version_id() {
                return Err(StrataError::Storage(format!(
                    "Entry {} names release {} but holds {}",
                    entry.tag,
                    entry.release_id,
                    snapshot.version_id()
                )));
            }
            if history.by_release.contains_key(&entry.release_id) {
                return Err(StrataError::DuplicateVersion(entry.release_id));
            }
            history.push(entry, Arc::new(snapshot));
        }

        info!(
            "Opened snapshot store on {} with {} versions",
            backend.describe(),
            history.entries.len()
        );

        Ok(Self {
            history: RwLock::new(history),
            append_lock: Mutex::new(()),
            backend,
            engine,
        })
    }

    /// Filesystem store when `[store].directory` is set, in-memory otherwise
    pub fn from_config(config: &Config) -> StrataResult<Self> {
        match &config.store.directory {
            Some(directory) => {
                let backend = FilesystemBackend::new(directory, config.store.format)?;
                Self::open(Box::new(backend), config.diff.clone())
            }
            None => Self::in_memory(config.diff.clone()),
        }
    }

    /// Filesystem store in `[store].directory`, or the standard location
    /// (`STRATA_STORE_DIR`, else `~/.strata/snapshots`) when unset
    pub fn open_default(config: &Config) -> StrataResult<Self> {
        let directory = config
            .store
            .directory
            .clone()
            .unwrap_or_else(strata_store_dir);
        let backend = FilesystemBackend::new(directory, config.store.format)?;
        Self::open(Box::new(backend), config.diff.clone())
    }

    pub fn engine(&self) -> &DiffEngine {
        &self.engine
    }

    /// Append a snapshot and return its tag
    ///
    /// The snapshot reaches the backend before it becomes visible to readers.
    pub fn append(&self, snapshot: Snapshot) -> StrataResult<VersionTag> {
        validate_release_id(snapshot.version_id())?;
        let _writer = self.append_lock.lock();

        let tag = {
            let history = self.history.read();
            if history.by_release.contains_key(snapshot.version_id()) {
                return Err(StrataError::DuplicateVersion(
                    snapshot.version_id().to_string(),
                ));
            }
            VersionTag::from_sequence(history.entries.len() + 1)
        };

        let entry = HistoryEntry {
            tag,
            release_id: snapshot.version_id().to_string(),
            species_count: snapshot.len(),
            appended_at: Utc::now(),
        };
        self.backend.persist(&entry, &snapshot)?;

        info!(
            "Appended {} as {} ({} species)",
            entry.release_id, tag, entry.species_count
        );
        self.history.write().push(entry, Arc::new(snapshot));
        Ok(tag)
    }

    /// Snapshot for a tag, a release id or `latest`
    pub fn get(&self, reference: &str) -> StrataResult<Arc<Snapshot>> {
        self.history.read().resolve(reference).map(|(_, snapshot)| snapshot)
    }

    /// Tag a reference resolves to
    pub fn resolve(&self, reference: &str) -> StrataResult<VersionTag> {
        self.history.read().resolve(reference).map(|(tag, _)| tag)
    }

    /// Tags in append order
    pub fn history(&self) -> Vec<VersionTag> {
        self.history
            .read()
            .entries
            .iter()
            .map(|(entry, _)| entry.tag)
            .collect()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.history
            .read()
            .entries
            .iter()
            .map(|(entry, _)| entry.clone())
            .collect()
    }

    /// Every snapshot with its metadata, as of the moment of the call
    pub fn snapshots(&self) -> Vec<(HistoryEntry, Arc<Snapshot>)> {
        self.history.read().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.history.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compare two stored versions; they need not be adjacent
    pub fn diff(&self, from: &str, to: &str) -> StrataResult<ChangeReport> {
        self.diff_with(from, to, &self.engine)
    }

    /// Compare two stored versions with a different engine configuration
    pub fn diff_with(&self, from: &str, to: &str, engine: &DiffEngine) -> StrataResult<ChangeReport> {
        let (before, after) = {
            let history = self.history.read();
            (history.resolve(from)?, history.resolve(to)?)
        };
        debug!("Diffing {} against {}", before.0, after.0);
        Ok(engine.diff(&before.1, &after.1))
    }

    /// Reports for every pair of consecutive versions, computed in parallel
    pub fn diff_consecutive(&self) -> Vec<ChangeReport> {
        consecutive_reports(&self.engine, &self.snapshots())
    }
}

pub(crate) fn consecutive_reports(
    engine: &DiffEngine,
    snapshots: &[(HistoryEntry, Arc<Snapshot>)],
) -> Vec<ChangeReport> {
    snapshots
        .par_windows(2)
        .map(|pair| engine.diff(&pair[0].1, &pair[1].1))
        .collect()
}

impl fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("backend", &self.backend.describe())
            .field("versions", &self.len())
            .finish()
    }
}
