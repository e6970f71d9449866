//! Test utilities for the Strata workspace
//!
//! Shared fixtures (lineages, records, raw rows, snapshots) and an isolated
//! [`TestEnvironment`] whose temporary directory doubles as the store
//! directory. Used by the integration tests of the other crates.

pub mod environment;
pub mod fixtures;

pub use environment::TestEnvironment;
pub use fixtures::{
    corona_lineage, generate_release, lineage, phage_lineage, record, row, snapshot_of,
};

pub use anyhow::{Context, Result};
pub use tempfile;

/// Route `tracing` output through the test harness; safe to call repeatedly
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env(strata_core::logging::LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Run `f` inside a fresh environment that is cleaned up afterwards
pub fn with_test_env<F, R>(f: F) -> Result<R>
where
    F: FnOnce(&TestEnvironment) -> Result<R>,
{
    let env = TestEnvironment::new()?;
    f(&env)
}
