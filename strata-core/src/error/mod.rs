//! Core error types for Strata

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::PathViolation;

/// Main error type for Strata operations
#[derive(Error, Debug)]
pub enum StrataError {
    #[error("Malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: MalformedRecord },

    #[error("Duplicate species '{name}' in release {release}")]
    DuplicateSpecies { release: String, name: String },

    #[error("Invariant violation for '{species}': {violation}")]
    InvariantViolation {
        species: String,
        violation: PathViolation,
    },

    #[error("Unknown version: {0}")]
    UnknownVersion(String),

    #[error("Version already in history: {0}")]
    DuplicateVersion(String),

    #[error("Invalid release id '{release}': {reason}")]
    InvalidReleaseId { release: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl StrataError {
    /// Whether the error only affects a single input row
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StrataError::MalformedRecord { .. })
    }
}

/// Result type alias for Strata operations
pub type StrataResult<T> = Result<T, StrataError>;

/// Why a single input row could not be turned into a canonical record
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MalformedRecord {
    #[error("row has no species name")]
    MissingSpecies,

    #[error("field '{field}' holds an unusable {found} value")]
    InvalidValue { field: String, found: String },

    #[error("field '{field}' has conflicting values '{kept}' and '{ignored}'")]
    ConflictingValues {
        field: String,
        kept: String,
        ignored: String,
    },

    #[error("invalid lineage: {violation}")]
    InvalidLineage { violation: PathViolation },
}

// Conversion implementations for common error types
impl From<serde_json::Error> for StrataError {
    fn from(err: serde_json::Error) -> Self {
        StrataError::Serialization(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for StrataError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        StrataError::Serialization(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StrataError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        StrataError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for StrataError {
    fn from(err: toml::de::Error) -> Self {
        StrataError::Configuration(format!("Failed to parse config: {}", err))
    }
}

impl From<toml::ser::Error> for StrataError {
    fn from(err: toml::ser::Error) -> Self {
        StrataError::Configuration(format!("Failed to serialize config: {}", err))
    }
}

impl From<anyhow::Error> for StrataError {
    fn from(err: anyhow::Error) -> Self {
        StrataError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaxonRank;
    use std::io;

    #[test]
    fn test_error_display() {
        let dup = StrataError::DuplicateSpecies {
            release: "MSL37".to_string(),
            name: "Tobacco mosaic virus".to_string(),
        };
        assert_eq!(
            format!("{}", dup),
            "Duplicate species 'Tobacco mosaic virus' in release MSL37"
        );

        let unknown = StrataError::UnknownVersion("v9".to_string());
        assert_eq!(format!("{}", unknown), "Unknown version: v9");

        let gap = StrataError::InvariantViolation {
            species: "Phage Lambda".to_string(),
            violation: PathViolation::Gap {
                missing: TaxonRank::Order,
                below: TaxonRank::Family,
            },
        };
        assert_eq!(
            format!("{}", gap),
            "Invariant violation for 'Phage Lambda': rank order is absent but family is present"
        );

        let malformed = StrataError::MalformedRecord {
            row: 4,
            reason: MalformedRecord::MissingSpecies,
        };
        assert_eq!(
            format!("{}", malformed),
            "Malformed record at row 4: row has no species name"
        );
    }

    #[test]
    fn test_recoverable_classification() {
        let row = StrataError::MalformedRecord {
            row: 0,
            reason: MalformedRecord::InvalidValue {
                field: "host".to_string(),
                found: "array".to_string(),
            },
        };
        assert!(row.is_recoverable());
        assert!(!StrataError::UnknownVersion("latest".to_string()).is_recoverable());
        assert!(!StrataError::DuplicateVersion("MSL38".to_string()).is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let strata_err: StrataError = io_err.into();

        match strata_err {
            StrataError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            _ => panic!("Expected Io error variant"),
        }
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let parse_result: Result<serde_json::Value, serde_json::Error> =
            serde_json::from_str("{invalid json}");
        let strata_err: StrataError = parse_result.unwrap_err().into();

        match strata_err {
            StrataError::Serialization(msg) => assert!(msg.contains("key must be a string")),
            _ => panic!("Expected Serialization error variant"),
        }
    }

    #[test]
    fn test_anyhow_error_conversion() {
        let strata_err: StrataError = anyhow::anyhow!("custom error message").into();
        match strata_err {
            StrataError::Other(msg) => assert_eq!(msg, "custom error message"),
            _ => panic!("Expected Other error variant"),
        }
    }

    #[test]
    fn test_malformed_record_serializes_with_kind_tag() {
        let reason = MalformedRecord::InvalidValue {
            field: "proposal_id".to_string(),
            found: "object".to_string(),
        };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["kind"], "invalid_value");
        assert_eq!(json["field"], "proposal_id");
    }
}
