//! Lineage of a species through the rank hierarchy

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::change::RankChange;
use super::rank::TaxonRank;

/// Rank → name assignments locating a species in the hierarchy.
///
/// Entries are kept in rank order. A valid path is populated from the realm
/// down to some stopping rank without holes, never stores an empty name, and
/// never carries a species-level entry (the species name is the record key).
/// Construction does not enforce this; call [`ClassificationPath::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationPath {
    ranks: BTreeMap<TaxonRank, String>,
}

/// Ways a [`ClassificationPath`] can break its invariants
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum PathViolation {
    #[error("rank {missing} is absent but {below} is present")]
    Gap {
        missing: TaxonRank,
        below: TaxonRank,
    },

    #[error("rank {rank} has an empty name")]
    EmptyName { rank: TaxonRank },

    #[error("species rank belongs to the record name, not its lineage")]
    SpeciesLevel,
}

impl ClassificationPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill lineage ranks in order starting at the realm
    pub fn from_top<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ranks = TaxonRank::LINEAGE
            .iter()
            .copied()
            .zip(names.into_iter().map(Into::into))
            .collect();
        Self { ranks }
    }

    /// Builder-style insert
    pub fn with(mut self, rank: TaxonRank, name: impl Into<String>) -> Self {
        self.insert(rank, name);
        self
    }

    pub fn insert(&mut self, rank: TaxonRank, name: impl Into<String>) -> Option<String> {
        self.ranks.insert(rank, name.into())
    }

    pub fn get(&self, rank: TaxonRank) -> Option<&str> {
        self.ranks.get(&rank).map(String::as_str)
    }

    pub fn contains(&self, rank: TaxonRank) -> bool {
        self.ranks.contains_key(&rank)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Populated ranks, most general first
    pub fn iter(&self) -> impl Iterator<Item = (TaxonRank, &str)> {
        self.ranks.iter().map(|(rank, name)| (*rank, name.as_str()))
    }

    /// The most specific populated rank
    pub fn stopping_rank(&self) -> Option<TaxonRank> {
        self.ranks.keys().next_back().copied()
    }

    /// Check the no-gap, no-empty, no-species invariants
    pub fn validate(&self) -> Result<(), PathViolation> {
        if self.contains(TaxonRank::Species) {
            return Err(PathViolation::SpeciesLevel);
        }

        if let Some((rank, _)) = self.ranks.iter().find(|(_, name)| name.trim().is_empty()) {
            return Err(PathViolation::EmptyName { rank: *rank });
        }

        if let Some(stop) = self.stopping_rank() {
            if let Some(missing) = stop.ancestors().iter().find(|r| !self.contains(**r)) {
                let below = self
                    .ranks
                    .keys()
                    .copied()
                    .find(|r| r > missing)
                    .unwrap_or(stop);
                return Err(PathViolation::Gap {
                    missing: *missing,
                    below,
                });
            }
        }

        Ok(())
    }

    /// Every rank whose value differs between `self` (before) and `other` (after)
    pub fn differences(&self, other: &ClassificationPath) -> BTreeMap<TaxonRank, RankChange> {
        TaxonRank::ALL
            .iter()
            .copied()
            .filter_map(|rank| {
                let before = self.get(rank);
                let after = other.get(rank);
                (before != after).then(|| {
                    (
                        rank,
                        RankChange {
                            before: before.map(str::to_string),
                            after: after.map(str::to_string),
                        },
                    )
                })
            })
            .collect()
    }

    /// The most specific rank populated in both paths
    pub fn lowest_shared_rank(&self, other: &ClassificationPath) -> Option<TaxonRank> {
        self.ranks
            .keys()
            .rev()
            .copied()
            .find(|rank| other.contains(*rank))
    }
}

impl fmt::Display for ClassificationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (rank, name) in self.iter() {
            if !first {
                f.write_str(" > ")?;
            }
            write!(f, "{}:{}", rank, name)?;
            first = false;
        }
        Ok(())
    }
}

impl FromIterator<(TaxonRank, String)> for ClassificationPath {
    fn from_iter<T: IntoIterator<Item = (TaxonRank, String)>>(iter: T) -> Self {
        Self {
            ranks: iter.into_iter().collect(),
        }
    }
}
