/// Canonical species records produced by normalization
use serde::{Deserialize, Serialize};

use super::path::{ClassificationPath, PathViolation};

/// Optional descriptive attributes carried alongside a species
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeciesAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genome_composition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal_id: Option<String>,
}

impl SpeciesAttributes {
    pub fn is_empty(&self) -> bool {
        self.genome_composition.is_none() && self.host.is_none() && self.proposal_id.is_none()
    }
}

/// One species in one release, keyed by its scientific name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub scientific_name: String,
    pub classification: ClassificationPath,
    #[serde(default)]
    pub attributes: SpeciesAttributes,
}

impl SpeciesRecord {
    pub fn new(scientific_name: impl Into<String>, classification: ClassificationPath) -> Self {
        Self {
            scientific_name: scientific_name.into(),
            classification,
            attributes: SpeciesAttributes::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: SpeciesAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn name(&self) -> &str {
        &self.scientific_name
    }

    pub fn validate(&self) -> Result<(), PathViolation> {
        self.classification.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaxonRank;

    #[test]
    fn test_record_builder() {
        let record = SpeciesRecord::new(
            "Tobacco mosaic virus",
            ClassificationPath::from_top(["Riboviria", "Orthornavirae"]),
        )
        .with_attributes(SpeciesAttributes {
            genome_composition: Some("ssRNA(+)".to_string()),
            host: Some("plants".to_string()),
            proposal_id: None,
        });

        assert_eq!(record.name(), "Tobacco mosaic virus");
        assert_eq!(record.classification.get(TaxonRank::Kingdom), Some("Orthornavirae"));
        assert!(!record.attributes.is_empty());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_empty_attributes_are_omitted_from_json() {
        let record = SpeciesRecord::new("Phage Lambda", ClassificationPath::new());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["attributes"], serde_json::json!({}));

        let back: SpeciesRecord =
            serde_json::from_str(r#"{"scientific_name":"Phage Lambda","classification":{}}"#)
                .unwrap();
        assert_eq!(back, record);
    }
}
