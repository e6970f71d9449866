//! Configuration types for Strata

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::types::TaxonRank;
use crate::StrataError;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Rename detection and restructure clustering knobs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiffConfig {
    /// Pairs must score strictly above this to be considered a rename
    #[serde(default = "default_rename_threshold")]
    pub rename_threshold: f64,
    /// Added to the name similarity when the lowest shared lineage rank agrees
    #[serde(default = "default_genus_bonus")]
    pub genus_bonus: f64,
    #[serde(default = "default_detect_renames")]
    pub detect_renames: bool,
    /// Rank whose before-value groups reclassifications into restructure events
    #[serde(default = "default_restructure_rank")]
    pub restructure_rank: TaxonRank,
    #[serde(default = "default_restructure_min_count")]
    pub restructure_min_count: usize,
    /// Fraction of the old value's population; above 1.0 disables the rule
    #[serde(default = "default_restructure_min_fraction")]
    pub restructure_min_fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizerConfig {
    /// Raw values treated as absent (compared case-insensitively)
    #[serde(default = "default_null_markers")]
    pub null_markers: Vec<String>,
    /// Canonical field name → additional header names
    #[serde(default)]
    pub extra_aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Json,
    Msgpack,
}

impl SnapshotFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &str {
        match self {
            Self::Json => "json",
            Self::Msgpack => "msgpack",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StoreConfig {
    /// Directory for persisted snapshots; in-memory only when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub format: SnapshotFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_rename_threshold() -> f64 { 0.8 }
fn default_genus_bonus() -> f64 { 0.15 }
fn default_detect_renames() -> bool { true }
fn default_restructure_rank() -> TaxonRank { TaxonRank::Family }
fn default_restructure_min_count() -> usize { 10 }
fn default_restructure_min_fraction() -> f64 { 0.5 }
fn default_log_level() -> String { "info".to_string() }
fn default_null_markers() -> Vec<String> {
    ["", "-", "na", "n/a", "null", "none", "unassigned"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            rename_threshold: default_rename_threshold(),
            genus_bonus: default_genus_bonus(),
            detect_renames: default_detect_renames(),
            restructure_rank: default_restructure_rank(),
            restructure_min_count: default_restructure_min_count(),
            restructure_min_fraction: default_restructure_min_fraction(),
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            null_markers: default_null_markers(),
            extra_aliases: BTreeMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl DiffConfig {
    /// Reject values that would make the diff meaningless
    pub fn validate(&self) -> Result<(), StrataError> {
        if !self.rename_threshold.is_finite() || self.rename_threshold < 0.0 {
            return Err(StrataError::Configuration(format!(
                "rename_threshold must be a non-negative number, got {}",
                self.rename_threshold
            )));
        }
        if !self.genus_bonus.is_finite() || self.genus_bonus < 0.0 {
            return Err(StrataError::Configuration(format!(
                "genus_bonus must be a non-negative number, got {}",
                self.genus_bonus
            )));
        }
        if !self.restructure_min_fraction.is_finite() || self.restructure_min_fraction <= 0.0 {
            return Err(StrataError::Configuration(format!(
                "restructure_min_fraction must be positive, got {}",
                self.restructure_min_fraction
            )));
        }
        if self.restructure_min_count == 0 {
            return Err(StrataError::Configuration(
                "restructure_min_count must be at least 1".to_string(),
            ));
        }
        if self.restructure_rank == TaxonRank::Species {
            return Err(StrataError::Configuration(
                "restructure_rank must be a lineage rank, not species".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, StrataError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    config.diff.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), StrataError> {
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
