//! Change records produced by comparing two releases

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::path::ClassificationPath;
use super::rank::TaxonRank;

/// Before/after value of one rank. `None` means the rank was absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankChange {
    pub before: Option<String>,
    pub after: Option<String>,
}

/// A species that only exists on one side of a comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesChange {
    pub species: String,
    pub classification: ClassificationPath,
}

/// A removed name paired with an added name by similarity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
    /// Score that qualified the pair (name similarity plus lineage bonus)
    pub similarity: f64,
    /// Lineage differences between the old and the new entry
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub changed_ranks: BTreeMap<TaxonRank, RankChange>,
}

/// A species kept under the same name whose lineage moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reclassification {
    pub species: String,
    pub changed_ranks: BTreeMap<TaxonRank, RankChange>,
}

impl Reclassification {
    pub fn change_at(&self, rank: TaxonRank) -> Option<&RankChange> {
        self.changed_ranks.get(&rank)
    }
}

/// Many reclassifications sharing one origin value, collapsed together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestructureEvent {
    pub rank: TaxonRank,
    pub old_value: String,
    /// Values the members were moved to; `None` when the rank was dropped
    pub new_values: BTreeSet<Option<String>>,
    pub member_species: Vec<String>,
}

/// One explainable difference between two releases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ChangeRecord {
    Added(SpeciesChange),
    Removed(SpeciesChange),
    Renamed(Rename),
    Reclassified(Reclassification),
    Restructured(RestructureEvent),
}

/// Per-category counts of a [`ChangeReport`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub added: usize,
    pub removed: usize,
    pub renamed: usize,
    pub reclassified: usize,
    pub restructure_events: usize,
    pub restructured_species: usize,
    pub unchanged: usize,
}

/// Full change set between two releases.
///
/// Every list is sorted by species name (or by rank then old value for
/// restructure events) so identical inputs serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeReport {
    pub from_version: String,
    pub to_version: String,
    pub added: Vec<SpeciesChange>,
    pub removed: Vec<SpeciesChange>,
    pub renamed: Vec<Rename>,
    pub reclassified: Vec<Reclassification>,
    pub restructured: Vec<RestructureEvent>,
    /// Names present in both releases with identical lineage
    pub unchanged: usize,
}

impl ChangeReport {
    pub fn empty(from_version: impl Into<String>, to_version: impl Into<String>) -> Self {
        Self {
            from_version: from_version.into(),
            to_version: to_version.into(),
            added: Vec::new(),
            removed: Vec::new(),
            renamed: Vec::new(),
            reclassified: Vec::new(),
            restructured: Vec::new(),
            unchanged: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.renamed.is_empty()
            && self.reclassified.is_empty()
            && self.restructured.is_empty()
    }

    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            added: self.added.len(),
            removed: self.removed.len(),
            renamed: self.renamed.len(),
            reclassified: self.reclassified.len(),
            restructure_events: self.restructured.len(),
            restructured_species: self
                .restructured
                .iter()
                .map(|event| event.member_species.len())
                .sum(),
            unchanged: self.unchanged,
        }
    }

    /// Flatten into tagged records, in category order
    pub fn records(&self) -> Vec<ChangeRecord> {
        self.added
            .iter()
            .cloned()
            .map(ChangeRecord::Added)
            .chain(self.removed.iter().cloned().map(ChangeRecord::Removed))
            .chain(self.renamed.iter().cloned().map(ChangeRecord::Renamed))
            .chain(self.reclassified.iter().cloned().map(ChangeRecord::Reclassified))
            .chain(self.restructured.iter().cloned().map(ChangeRecord::Restructured))
            .collect()
    }

    /// Every name mentioned by a change, on either side
    pub fn names_touched(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        names.extend(self.added.iter().map(|c| c.species.as_str()));
        names.extend(self.removed.iter().map(|c| c.species.as_str()));
        for rename in &self.renamed {
            names.insert(rename.from.as_str());
            names.insert(rename.to.as_str());
        }
        names.extend(self.reclassified.iter().map(|c| c.species.as_str()));
        for event in &self.restructured {
            names.extend(event.member_species.iter().map(String::as_str));
        }
        names
    }

    /// Follow a rename forward, if `name` was renamed in this report
    pub fn renamed_to(&self, name: &str) -> Option<&str> {
        self.renamed
            .iter()
            .find(|r| r.from == name)
            .map(|r| r.to.as_str())
    }

    /// Follow a rename backward, if `name` is the result of a rename
    pub fn renamed_from(&self, name: &str) -> Option<&str> {
        self.renamed
            .iter()
            .find(|r| r.to == name)
            .map(|r| r.from.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> ChangeReport {
        let mut report = ChangeReport::empty("v1", "v2");
        report.added.push(SpeciesChange {
            species: "SARS-CoV-2".to_string(),
            classification: ClassificationPath::new(),
        });
        report.renamed.push(Rename {
            from: "Phage L".to_string(),
            to: "Phage Lambda".to_string(),
            similarity: 0.9,
            changed_ranks: BTreeMap::new(),
        });
        report.restructured.push(RestructureEvent {
            rank: TaxonRank::Family,
            old_value: "Siphoviridae".to_string(),
            new_values: [Some("Drexlerviridae".to_string())].into_iter().collect(),
            member_species: vec!["Phage A".to_string(), "Phage B".to_string()],
        });
        report.unchanged = 4;
        report
    }

    #[test]
    fn test_summary_counts() {
        let summary = sample_report().summary();
        assert_eq!(summary.added, 1);
        assert_eq!(summary.renamed, 1);
        assert_eq!(summary.restructure_events, 1);
        assert_eq!(summary.restructured_species, 2);
        assert_eq!(summary.unchanged, 4);
    }

    #[test]
    fn test_names_touched_and_rename_links() {
        let report = sample_report();
        let names: Vec<_> = report.names_touched().into_iter().collect();
        assert_eq!(
            names,
            vec!["Phage A", "Phage B", "Phage L", "Phage Lambda", "SARS-CoV-2"]
        );
        assert_eq!(report.renamed_to("Phage L"), Some("Phage Lambda"));
        assert_eq!(report.renamed_from("Phage Lambda"), Some("Phage L"));
        assert_eq!(report.renamed_to("SARS-CoV-2"), None);
    }

    #[test]
    fn test_records_are_tagged() {
        let records = sample_report().records();
        assert_eq!(records.len(), 3);
        let json = serde_json::to_value(&records[1]).unwrap();
        assert_eq!(json["change"], "renamed");
        assert_eq!(json["from"], "Phage L");
    }

    #[test]
    fn test_empty_report() {
        let report = ChangeReport::empty("a", "b");
        assert!(report.is_empty());
        assert!(!sample_report().is_empty());
    }
}
