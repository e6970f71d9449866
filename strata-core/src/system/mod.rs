pub mod paths;

// Re-export commonly used functions
pub use paths::{strata_home, strata_store_dir};
