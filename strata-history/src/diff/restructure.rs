//! Collapsing of mass reclassifications into restructure events

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use strata_core::{DiffConfig, Reclassification, RestructureEvent};

use crate::snapshot::Snapshot;

/// Group reclassifications by the value each species held at the
/// configured rank in `before`, whichever of its ranks changed.
///
/// A group becomes one [`RestructureEvent`] when it has at least
/// `restructure_min_count` members, or when it holds at least two members
/// making up `restructure_min_fraction` of the old value's population in
/// `before`. Species that had no value at the rank stay individual.
pub fn cluster_restructures(
    reclassified: Vec<Reclassification>,
    before: &Snapshot,
    after: &Snapshot,
    config: &DiffConfig,
) -> (Vec<Reclassification>, Vec<RestructureEvent>) {
    let rank = config.restructure_rank;
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();

    for (i, change) in reclassified.iter().enumerate() {
        let old = before
            .get(&change.species)
            .and_then(|record| record.classification.get(rank));
        if let Some(old) = old {
            groups.entry(old).or_default().push(i);
        }
    }

    let mut collapsed = vec![false; reclassified.len()];
    let mut events = Vec::new();

    for (old_value, members) in groups {
        let population = before.stats().population(rank, old_value);
        let fraction = if population == 0 {
            0.0
        } else {
            members.len() as f64 / population as f64
        };

        let by_count = members.len() >= config.restructure_min_count;
        let by_fraction = members.len() >= 2 && fraction >= config.restructure_min_fraction;
        if !(by_count || by_fraction) {
            continue;
        }

        let mut new_values = BTreeSet::new();
        let mut member_species = Vec::with_capacity(members.len());
        for &i in &members {
            collapsed[i] = true;
            let species = &reclassified[i].species;
            let new_value = after
                .get(species)
                .and_then(|record| record.classification.get(rank))
                .map(str::to_string);
            new_values.insert(new_value);
            member_species.push(species.clone());
        }
        member_species.sort();

        debug!(
            "Restructure under {} '{}': {} of {} species reclassified",
            rank,
            old_value,
            member_species.len(),
            population
        );

        events.push(RestructureEvent {
            rank,
            old_value: old_value.to_string(),
            new_values,
            member_species,
        });
    }

    let remaining = reclassified
        .into_iter()
        .zip(collapsed)
        .filter_map(|(change, taken)| (!taken).then_some(change))
        .collect();

    (remaining, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SnapshotBuilder;
    use strata_core::{ClassificationPath, SpeciesRecord, TaxonRank};

    fn lineage(family: Option<&str>) -> ClassificationPath {
        let mut names = vec![
            "Duplodnaviria",
            "Heunggongvirae",
            "Uroviricota",
            "Caudoviricetes",
            "Caudovirales",
        ];
        names.extend(family);
        ClassificationPath::from_top(names)
    }

    fn phage(name: &str, family: Option<&str>) -> SpeciesRecord {
        SpeciesRecord::new(name, lineage(family))
    }

    fn family_release(counts: &[(&str, usize)]) -> Vec<SpeciesRecord> {
        counts
            .iter()
            .flat_map(|&(family, n)| (0..n).map(move |i| phage(&format!("{family} phage {i}"), Some(family))))
            .collect()
    }

    fn snapshot(id: &str, records: Vec<SpeciesRecord>) -> Snapshot {
        SnapshotBuilder::build(id, records).unwrap()
    }

    /// Reclassifications between two snapshots, sorted by species
    fn reclassify(before: &Snapshot, after: &Snapshot) -> Vec<Reclassification> {
        let mut changes: Vec<_> = before
            .records()
            .filter_map(|old| {
                let new = after.get(old.name())?;
                let changed_ranks = old.classification.differences(&new.classification);
                (!changed_ranks.is_empty()).then(|| Reclassification {
                    species: old.scientific_name.clone(),
                    changed_ranks,
                })
            })
            .collect();
        changes.sort_by(|a, b| a.species.cmp(&b.species));
        changes
    }

    /// Copy of `records` with `moves` applied
    fn moved(records: &[SpeciesRecord], moves: &[(&str, Option<&str>)]) -> Vec<SpeciesRecord> {
        records
            .iter()
            .map(|record| {
                match moves.iter().find(|(name, _)| *name == record.scientific_name) {
                    Some((name, family)) => phage(name, *family),
                    None => record.clone(),
                }
            })
            .collect()
    }

    fn cluster(
        before: &Snapshot,
        after: &Snapshot,
        config: &DiffConfig,
    ) -> (Vec<Reclassification>, Vec<RestructureEvent>) {
        cluster_restructures(reclassify(before, after), before, after, config)
    }

    #[test]
    fn test_count_rule() {
        let records = family_release(&[("Siphoviridae", 100)]);
        let names: Vec<String> = (0..10).map(|i| format!("Siphoviridae phage {i}")).collect();
        let moves: Vec<_> = names.iter().map(|n| (n.as_str(), Some("Drexlerviridae"))).collect();
        let before = snapshot("MSL1", records.clone());
        let after = snapshot("MSL2", moved(&records, &moves));

        let (remaining, events) = cluster(&before, &after, &DiffConfig::default());

        assert!(remaining.is_empty());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].member_species.len(), 10);
        assert_eq!(events[0].old_value, "Siphoviridae");
    }

    #[test]
    fn test_fraction_rule() {
        let records = family_release(&[("Tectiviridae", 4), ("Siphoviridae", 100)]);
        let before = snapshot("MSL1", records.clone());
        let after = snapshot(
            "MSL2",
            moved(
                &records,
                &[
                    ("Tectiviridae phage 0", Some("Autolykiviridae")),
                    ("Tectiviridae phage 1", None),
                    ("Siphoviridae phage 0", Some("Demerecviridae")),
                    ("Siphoviridae phage 1", Some("Demerecviridae")),
                ],
            ),
        );

        let (remaining, events) = cluster(&before, &after, &DiffConfig::default());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].old_value, "Tectiviridae");
        assert_eq!(
            events[0].new_values,
            BTreeSet::from([None, Some("Autolykiviridae".to_string())])
        );
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|c| c.species.starts_with("Siphoviridae")));
    }

    #[test]
    fn test_single_move_stays_individual() {
        let records = family_release(&[("Siphoviridae", 1)]);
        let before = snapshot("MSL1", records.clone());
        let after = snapshot(
            "MSL2",
            moved(&records, &[("Siphoviridae phage 0", Some("Drexlerviridae"))]),
        );

        let (remaining, events) = cluster(&before, &after, &DiffConfig::default());
        assert!(events.is_empty());
        assert_eq!(remaining.len(), 1);
    }

    #[test]
    fn test_changes_below_the_rank_group_by_ancestor() {
        // Ten species in one order each gain a subfamily and genus
        let records: Vec<_> = (0..10)
            .map(|i| phage(&format!("Escherichia phage {i}"), Some("Siphoviridae")))
            .collect();
        let refined: Vec<_> = records
            .iter()
            .map(|record| {
                let mut record = record.clone();
                record.classification.insert(TaxonRank::Subfamily, "Tunavirinae");
                record.classification.insert(TaxonRank::Genus, "Tunavirus");
                record
            })
            .collect();
        let before = snapshot("MSL1", records);
        let after = snapshot("MSL2", refined);
        let config = DiffConfig {
            restructure_rank: TaxonRank::Order,
            restructure_min_count: 10,
            ..DiffConfig::default()
        };

        let (remaining, events) = cluster(&before, &after, &config);

        assert!(remaining.is_empty());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].rank, TaxonRank::Order);
        assert_eq!(events[0].old_value, "Caudovirales");
        assert_eq!(
            events[0].new_values,
            BTreeSet::from([Some("Caudovirales".to_string())])
        );
        assert_eq!(events[0].member_species.len(), 10);
    }

    #[test]
    fn test_species_without_the_rank_stay_individual() {
        let records: Vec<_> = (0..3)
            .map(|i| phage(&format!("Unplaced phage {i}"), None))
            .collect();
        let placed: Vec<_> = (0..3)
            .map(|i| phage(&format!("Unplaced phage {i}"), Some("Siphoviridae")))
            .collect();
        let before = snapshot("MSL1", records);
        let after = snapshot("MSL2", placed);
        let config = DiffConfig {
            restructure_min_count: 2,
            ..DiffConfig::default()
        };

        let (remaining, events) = cluster(&before, &after, &config);
        assert!(events.is_empty());
        assert_eq!(remaining.len(), 3);
    }
}
