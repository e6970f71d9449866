/// Core types shared across all Strata modules
pub mod change;
pub mod path;
pub mod rank;
pub mod record;

// Re-export commonly used types at module level
pub use change::{
    ChangeRecord, ChangeReport, ChangeSummary, RankChange, Reclassification, Rename,
    RestructureEvent, SpeciesChange,
};
pub use path::{ClassificationPath, PathViolation};
pub use rank::TaxonRank;
pub use record::{SpeciesAttributes, SpeciesRecord};
