//! Core utilities and types shared across all Strata crates

pub mod config;
pub mod error;
pub mod logging;
pub mod system;
pub mod types;

// Re-export commonly used types
pub use config::{
    load_config, save_config, Config, DiffConfig, LoggingConfig, NormalizerConfig, SnapshotFormat,
    StoreConfig,
};
pub use error::{MalformedRecord, StrataError, StrataResult};
pub use logging::init_logging;

pub use types::{
    ChangeRecord, ChangeReport, ChangeSummary, ClassificationPath, PathViolation, RankChange,
    Reclassification, Rename, RestructureEvent, SpeciesAttributes, SpeciesChange, SpeciesRecord,
    TaxonRank,
};

pub use system::{strata_home, strata_store_dir};

/// Version information for the Strata project
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
