/// Persistence backends for the snapshot history
///
/// A backend only ever sees appends. The store writes a snapshot through
/// its backend before publishing it in memory, and replays
/// [`SnapshotBackend::load_all`] when opened.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use strata_core::{SnapshotFormat, StrataError, StrataResult};

use super::{HistoryEntry, VersionTag};
use crate::snapshot::Snapshot;

pub trait SnapshotBackend: Send + Sync {
    /// Durably record one appended snapshot; never overwrites
    fn persist(&self, entry: &HistoryEntry, snapshot: &Snapshot) -> StrataResult<()>;

    /// Every persisted snapshot in tag order
    fn load_all(&self) -> StrataResult<Vec<(HistoryEntry, Snapshot)>>;

    fn describe(&self) -> String;
}

/// Keeps nothing beyond the in-memory history
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryBackend;

impl SnapshotBackend for MemoryBackend {
    fn persist(&self, _entry: &HistoryEntry, _snapshot: &Snapshot) -> StrataResult<()> {
        Ok(())
    }

    fn load_all(&self) -> StrataResult<Vec<(HistoryEntry, Snapshot)>> {
        Ok(Vec::new())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedSnapshot {
    entry: HistoryEntry,
    snapshot: Snapshot,
}

/// One file per snapshot, named after its tag (`v3.json`, `v3.msgpack`)
#[derive(Debug, Clone)]
pub struct FilesystemBackend {
    directory: PathBuf,
    format: SnapshotFormat,
}

impl FilesystemBackend {
    pub fn new(directory: impl Into<PathBuf>, format: SnapshotFormat) -> StrataResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self { directory, format })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn format(&self) -> SnapshotFormat {
        self.format
    }

    fn path_for(&self, tag: &VersionTag) -> PathBuf {
        self.directory
            .join(format!("{}.{}", tag, self.format.extension()))
    }

    fn encode(&self, persisted: &PersistedSnapshot) -> StrataResult<Vec<u8>> {
        match self.format {
            SnapshotFormat::Json => Ok(serde_json::to_vec_pretty(persisted)?),
            // Named encoding so optional fields survive the round trip
            SnapshotFormat::Msgpack => Ok(rmp_serde::to_vec_named(persisted)?),
        }
    }

    fn decode(&self, path: &Path) -> StrataResult<PersistedSnapshot> {
        let bytes = fs::read(path)?;
        let persisted = match self.format {
            SnapshotFormat::Json => serde_json::from_slice(&bytes)?,
            SnapshotFormat::Msgpack => rmp_serde::from_slice(&bytes)?,
        };
        Ok(persisted)
    }
}

impl SnapshotBackend for FilesystemBackend {
    fn persist(&self, entry: &HistoryEntry, snapshot: &Snapshot) -> StrataResult<()> {
        let path = self.path_for(&entry.tag);
        if path.exists() {
            return Err(StrataError::Storage(format!(
                "Refusing to overwrite persisted snapshot {}",
                path.display()
            )));
        }

        let bytes = self.encode(&PersistedSnapshot {
            entry: entry.clone(),
            snapshot: snapshot.clone(),
        })?;

        // Write-then-rename so a crash never leaves a truncated snapshot
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;

        debug!("Persisted {} to {}", entry.tag, path.display());
        Ok(())
    }

    fn load_all(&self) -> StrataResult<Vec<(HistoryEntry, Snapshot)>> {
        let mut found = Vec::new();
        for dir_entry in fs::read_dir(&self.directory)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.format.extension()) {
                continue;
            }
            let Some(tag) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<VersionTag>().ok())
            else {
                continue;
            };
            found.push((tag.sequence(), path));
        }
        found.sort();

        let mut loaded = Vec::with_capacity(found.len());
        for (expected, (sequence, path)) in (1..).zip(found) {
            if sequence != expected {
                return Err(StrataError::Storage(format!(
                    "History in {} is missing v{}",
                    self.directory.display(),
                    expected
                )));
            }
            let persisted = self.decode(&path)?;
            if persisted.entry.tag.sequence() != sequence {
                return Err(StrataError::Storage(format!(
                    "{} holds entry {}",
                    path.display(),
                    persisted.entry.tag
                )));
            }
            loaded.push((persisted.entry, persisted.snapshot));
        }

        info!(
            "Loaded {} snapshots from {}",
            loaded.len(),
            self.directory.display()
        );
        Ok(loaded)
    }

    fn describe(&self) -> String {
        format!(
            "filesystem ({}, {})",
            self.directory.display(),
            self.format.extension()
        )
    }
}
