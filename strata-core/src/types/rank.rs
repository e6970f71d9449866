/// Taxonomic ranks, ordered from most general to most specific
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::StrataError;

/// A rank in the classification hierarchy.
///
/// The derived ordering follows the hierarchy: `Realm < Kingdom < ... < Species`,
/// so a *smaller* rank is a *more general* one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonRank {
    Realm,
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Subfamily,
    Genus,
    Species,
}

impl TaxonRank {
    /// Every rank, most general first
    pub const ALL: [TaxonRank; 9] = [
        TaxonRank::Realm,
        TaxonRank::Kingdom,
        TaxonRank::Phylum,
        TaxonRank::Class,
        TaxonRank::Order,
        TaxonRank::Family,
        TaxonRank::Subfamily,
        TaxonRank::Genus,
        TaxonRank::Species,
    ];

    /// Ranks that make up a lineage (everything above the species itself)
    pub const LINEAGE: [TaxonRank; 8] = [
        TaxonRank::Realm,
        TaxonRank::Kingdom,
        TaxonRank::Phylum,
        TaxonRank::Class,
        TaxonRank::Order,
        TaxonRank::Family,
        TaxonRank::Subfamily,
        TaxonRank::Genus,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Realm => "realm",
            Self::Kingdom => "kingdom",
            Self::Phylum => "phylum",
            Self::Class => "class",
            Self::Order => "order",
            Self::Family => "family",
            Self::Subfamily => "subfamily",
            Self::Genus => "genus",
            Self::Species => "species",
        }
    }

    /// Position in the hierarchy, 0 for realm
    pub fn depth(&self) -> usize {
        *self as usize
    }

    pub fn is_more_general_than(&self, other: TaxonRank) -> bool {
        *self < other
    }

    /// The ranks strictly more general than this one, most general first
    pub fn ancestors(&self) -> &'static [TaxonRank] {
        &Self::ALL[..self.depth()]
    }

    pub fn is_lineage_rank(&self) -> bool {
        *self != TaxonRank::Species
    }
}

impl fmt::Display for TaxonRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaxonRank {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|rank| rank.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| StrataError::Configuration(format!("Unknown taxon rank: {}", s)))
    }
}
