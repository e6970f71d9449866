//! Test environment management
//!
//! Each [`TestEnvironment`] owns a temporary home directory, points
//! `STRATA_HOME` / `STRATA_STORE_DIR` at it and restores the previous values
//! when dropped.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use strata_core::{Config, SnapshotFormat};
use strata_history::{FilesystemBackend, SnapshotStore};

pub struct TestEnvironment {
    _temp_dir: TempDir,
    root_path: PathBuf,
    saved_env: HashMap<String, Option<String>>,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::with_prefix("strata-test")
            .context("Failed to create temporary directory")?;
        let root_path = temp_dir.path().to_path_buf();
        std::fs::create_dir_all(root_path.join("snapshots"))?;

        let mut env = Self {
            _temp_dir: temp_dir,
            root_path,
            saved_env: HashMap::new(),
        };
        env.setup_environment();
        Ok(env)
    }

    fn setup_environment(&mut self) {
        let vars = [
            ("STRATA_HOME", self.root_path.clone()),
            ("STRATA_STORE_DIR", self.store_dir()),
        ];
        for (key, value) in vars {
            self.saved_env
                .insert(key.to_string(), std::env::var(key).ok());
            std::env::set_var(key, value);
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    pub fn store_dir(&self) -> PathBuf {
        self.root_path.join("snapshots")
    }

    /// Default configuration with the store rooted in this environment
    pub fn config(&self, format: SnapshotFormat) -> Config {
        let mut config = Config::default();
        config.store.directory = Some(self.store_dir());
        config.store.format = format;
        config
    }

    /// Open (or reopen) the filesystem-backed store of this environment
    pub fn open_store(&self, format: SnapshotFormat) -> Result<SnapshotStore> {
        let config = self.config(format);
        let backend = FilesystemBackend::new(self.store_dir(), format)?;
        Ok(SnapshotStore::open(Box::new(backend), config.diff)?)
    }

    pub fn write_file(&self, path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
        let full_path = self.root_path.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full_path, content)?;
        Ok(())
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        for (key, value) in &self.saved_env {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}
