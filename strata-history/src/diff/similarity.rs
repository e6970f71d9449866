//! Scoring of candidate rename pairs

use strata_core::{DiffConfig, SpeciesRecord};

/// Case-insensitive normalized Levenshtein similarity in `[0, 1]`
pub fn name_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Best similarity two names of these lengths can reach
///
/// Levenshtein distance is at least the length difference, which lets the
/// matcher skip pairs that cannot clear the threshold.
pub fn similarity_upper_bound(a: &str, b: &str) -> f64 {
    let length = |s: &str| s.chars().flat_map(char::to_lowercase).count();
    let (la, lb) = (length(a), length(b));
    let longest = la.max(lb);
    if longest == 0 {
        return 1.0;
    }
    1.0 - la.abs_diff(lb) as f64 / longest as f64
}

/// Whether the most specific rank populated in both lineages agrees
pub fn shares_lowest_rank(old: &SpeciesRecord, new: &SpeciesRecord) -> bool {
    old.classification
        .lowest_shared_rank(&new.classification)
        .is_some_and(|rank| old.classification.get(rank) == new.classification.get(rank))
}

/// Name similarity plus the lineage bonus
pub fn rename_score(old: &SpeciesRecord, new: &SpeciesRecord, config: &DiffConfig) -> f64 {
    let mut score = name_similarity(&old.scientific_name, &new.scientific_name);
    if shares_lowest_rank(old, new) {
        score += config.genus_bonus;
    }
    score
}
