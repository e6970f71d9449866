//! Greedy pairing of removed and added names

use rayon::prelude::*;
use tracing::debug;

use strata_core::{DiffConfig, Rename, SpeciesRecord};

use super::similarity::{rename_score, similarity_upper_bound};

/// Rename pairs plus the records left unpaired on each side
#[derive(Debug, Default)]
pub struct RenameMatches<'a> {
    pub renames: Vec<Rename>,
    pub removed: Vec<&'a SpeciesRecord>,
    pub added: Vec<&'a SpeciesRecord>,
}

struct Candidate {
    score: f64,
    removed: usize,
    added: usize,
}

/// Pair removed names with added names.
///
/// Every pair scoring strictly above the threshold is a candidate. Candidates
/// are claimed best-first; equal scores go to the lexicographically smaller
/// removed name, then the smaller added name. Both inputs must be sorted by
/// name for the tie-break to hold.
pub fn match_renames<'a>(
    removed: Vec<&'a SpeciesRecord>,
    added: Vec<&'a SpeciesRecord>,
    config: &DiffConfig,
) -> RenameMatches<'a> {
    if !config.detect_renames || removed.is_empty() || added.is_empty() {
        return RenameMatches {
            renames: Vec::new(),
            removed,
            added,
        };
    }

    let mut candidates: Vec<Candidate> = removed
        .par_iter()
        .enumerate()
        .flat_map_iter(|(i, old)| {
            added.iter().enumerate().filter_map(move |(j, new)| {
                let reachable = similarity_upper_bound(&old.scientific_name, &new.scientific_name)
                    + config.genus_bonus;
                if reachable <= config.rename_threshold {
                    return None;
                }
                let score = rename_score(old, new, config);
                (score > config.rename_threshold).then_some(Candidate {
                    score,
                    removed: i,
                    added: j,
                })
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| removed[a.removed].scientific_name.cmp(&removed[b.removed].scientific_name))
            .then_with(|| added[a.added].scientific_name.cmp(&added[b.added].scientific_name))
    });

    let mut removed_claimed = vec![false; removed.len()];
    let mut added_claimed = vec![false; added.len()];
    let mut renames = Vec::new();

    for candidate in &candidates {
        if removed_claimed[candidate.removed] || added_claimed[candidate.added] {
            continue;
        }
        removed_claimed[candidate.removed] = true;
        added_claimed[candidate.added] = true;

        let old = removed[candidate.removed];
        let new = added[candidate.added];
        renames.push(Rename {
            from: old.scientific_name.clone(),
            to: new.scientific_name.clone(),
            similarity: candidate.score,
            changed_ranks: old.classification.differences(&new.classification),
        });
    }

    debug!(
        "Rename matching: {} candidates, {} pairs accepted",
        candidates.len(),
        renames.len()
    );

    renames.sort_by(|a, b| a.from.cmp(&b.from));

    RenameMatches {
        renames,
        removed: unclaimed(removed, &removed_claimed),
        added: unclaimed(added, &added_claimed),
    }
}

fn unclaimed<'a>(records: Vec<&'a SpeciesRecord>, claimed: &[bool]) -> Vec<&'a SpeciesRecord> {
    records
        .into_iter()
        .zip(claimed)
        .filter_map(|(record, &taken)| (!taken).then_some(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::ClassificationPath;

    fn record(name: &str) -> SpeciesRecord {
        SpeciesRecord::new(name, ClassificationPath::from_top(["Riboviria"]))
    }

    fn names(records: &[&SpeciesRecord]) -> Vec<String> {
        records.iter().map(|r| r.scientific_name.clone()).collect()
    }

    #[test]
    fn test_best_pair_wins() {
        let old = record("Tomato mosaic virus");
        let near = record("Tomato mosaic virus 2");
        let far = record("Tomato mottle virus");
        let config = DiffConfig::default();

        let matches = match_renames(vec![&old], vec![&near, &far], &config);

        assert_eq!(matches.renames.len(), 1);
        assert_eq!(matches.renames[0].to, "Tomato mosaic virus 2");
        assert!(matches.removed.is_empty());
        assert_eq!(names(&matches.added), vec!["Tomato mottle virus"]);
    }

    #[test]
    fn test_equal_scores_break_ties_by_removed_name() {
        // Both removed names are one edit away from the single added name
        let a = record("Virus AX");
        let b = record("Virus BX");
        let target = record("Virus CX");
        let config = DiffConfig {
            rename_threshold: 0.5,
            genus_bonus: 0.0,
            ..DiffConfig::default()
        };

        let matches = match_renames(vec![&a, &b], vec![&target], &config);

        assert_eq!(matches.renames.len(), 1);
        assert_eq!(matches.renames[0].from, "Virus AX");
        assert_eq!(names(&matches.removed), vec!["Virus BX"]);
    }

    #[test]
    fn test_disabled_detection_passes_everything_through() {
        let old = record("SARS-CoV");
        let new = record("SARS-CoV-2");
        let config = DiffConfig {
            detect_renames: false,
            ..DiffConfig::default()
        };

        let matches = match_renames(vec![&old], vec![&new], &config);
        assert!(matches.renames.is_empty());
        assert_eq!(matches.removed.len(), 1);
        assert_eq!(matches.added.len(), 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        let old = record("abcde");
        let new = record("abcdx");
        let config = DiffConfig {
            rename_threshold: 0.8,
            genus_bonus: 0.0,
            ..DiffConfig::default()
        };

        // similarity is exactly 0.8
        let matches = match_renames(vec![&old], vec![&new], &config);
        assert!(matches.renames.is_empty());
    }

    #[test]
    fn test_each_name_claimed_once() {
        let olds = [record("Phage P1"), record("Phage P2")];
        let news = [record("Phage P3")];
        let config = DiffConfig {
            rename_threshold: 0.5,
            ..DiffConfig::default()
        };

        let matches = match_renames(olds.iter().collect(), news.iter().collect(), &config);
        assert_eq!(matches.renames.len(), 1);
        assert_eq!(matches.removed.len() + matches.renames.len(), 2);
        assert!(matches.added.is_empty());
    }
}
