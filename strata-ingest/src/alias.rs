//! Header alias tables
//!
//! Column headers drift between releases ("Species", "Virus name",
//! "Current Species Name", ...). An [`AliasTable`] maps every known spelling
//! onto a [`CanonicalField`]. Lookups go through [`normalize_header`], so
//! case, surrounding whitespace and `_`/`-`/space separators never matter.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use strata_core::{StrataError, StrataResult, TaxonRank};

/// Field of the canonical record schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Species,
    Rank(TaxonRank),
    GenomeComposition,
    Host,
    ProposalId,
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Species => f.write_str("species"),
            Self::Rank(rank) => write!(f, "{}", rank),
            Self::GenomeComposition => f.write_str("genome_composition"),
            Self::Host => f.write_str("host"),
            Self::ProposalId => f.write_str("proposal_id"),
        }
    }
}

impl FromStr for CanonicalField {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_header(s).as_str() {
            "species" => Ok(Self::Species),
            "genome composition" => Ok(Self::GenomeComposition),
            "host" => Ok(Self::Host),
            "proposal id" => Ok(Self::ProposalId),
            other => match other.parse::<TaxonRank>() {
                Ok(rank) if rank.is_lineage_rank() => Ok(Self::Rank(rank)),
                _ => Err(StrataError::Configuration(format!(
                    "Unknown canonical field: {}",
                    s
                ))),
            },
        }
    }
}

/// Canonical form of a header: lowercase, separators collapsed to one space
pub fn normalize_header(header: &str) -> String {
    header
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Mapping from header spellings to canonical fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: HashMap<String, CanonicalField>,
    ignored: HashSet<String>,
}

impl AliasTable {
    /// An empty table; every header is unmapped
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers seen across ICTV Master Species List releases
    pub fn standard() -> Self {
        let mut table = Self::new();

        for header in [
            "Species",
            "Species name",
            "Virus name",
            "Virus names",
            "Current Species Name",
            "Scientific name",
        ] {
            table.insert(header, CanonicalField::Species);
        }

        for rank in TaxonRank::LINEAGE {
            table.insert(rank.name(), CanonicalField::Rank(rank));
        }

        for header in ["Genome Composition", "Genome", "Genome type"] {
            table.insert(header, CanonicalField::GenomeComposition);
        }

        for header in ["Host", "Host source", "Host Source", "Hosts"] {
            table.insert(header, CanonicalField::Host);
        }

        for header in [
            "Last Change Proposal",
            "Last Change Proposal ID",
            "Proposal",
            "Proposal ID",
            "Taxonomic Proposal",
        ] {
            table.insert(header, CanonicalField::ProposalId);
        }

        // Columns present in the source sheets that have no canonical field
        for header in [
            "Sort",
            "MSL #",
            "Subrealm",
            "Subkingdom",
            "Subphylum",
            "Subclass",
            "Suborder",
            "Subgenus",
            "Type Species?",
            "Last Change",
            "ICTV ID",
            "Taxon History URL",
        ] {
            table.ignore(header);
        }

        table
    }

    pub fn insert(&mut self, header: &str, field: CanonicalField) -> Option<CanonicalField> {
        let key = normalize_header(header);
        self.ignored.remove(&key);
        self.aliases.insert(key, field)
    }

    /// Builder-style insert
    pub fn with(mut self, header: &str, field: CanonicalField) -> Self {
        self.insert(header, field);
        self
    }

    /// Mark a header as known but irrelevant so it is not reported as unmapped
    pub fn ignore(&mut self, header: &str) {
        let key = normalize_header(header);
        if !self.aliases.contains_key(&key) {
            self.ignored.insert(key);
        }
    }

    pub fn resolve(&self, header: &str) -> Option<CanonicalField> {
        self.aliases.get(&normalize_header(header)).copied()
    }

    pub fn is_ignored(&self, header: &str) -> bool {
        self.ignored.contains(&normalize_header(header))
    }

    /// Add aliases given as canonical field name → header spellings
    pub fn extend_from_config(&mut self, extra: &BTreeMap<String, Vec<String>>) -> StrataResult<()> {
        for (field, headers) in extra {
            let field: CanonicalField = field.parse()?;
            for header in headers {
                self.insert(header, field);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
