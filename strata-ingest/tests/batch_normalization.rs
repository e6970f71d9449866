/// Integration tests for whole-release normalization
use serde_json::{json, Value};
use strata_core::{MalformedRecord, TaxonRank};
use strata_ingest::{RawRow, RecordNormalizer, Severity};

fn row(value: Value) -> RawRow {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => panic!("rows must be JSON objects"),
    }
}

fn good_row(i: usize) -> RawRow {
    let family = if i % 2 == 0 { "Siphoviridae" } else { "Myoviridae" };
    let species = format!("Escherichia phage {}", i);
    row(json!({
        "Realm": "Duplodnaviria",
        "Kingdom": "Heunggongvirae",
        "Phylum": "Uroviricota",
        "Class": "Caudoviricetes",
        "Order": "Caudovirales",
        "Family": family,
        "Species": species,
        "Genome Composition": "dsDNA",
    }))
}

#[test]
fn test_bad_rows_never_abort_the_batch() {
    let mut rows: Vec<RawRow> = (0..100).map(good_row).collect();
    rows.insert(10, row(json!({ "Family": "Siphoviridae" })));
    rows.insert(50, row(json!({ "Species": "", "Family": "Myoviridae" })));
    rows.push(row(json!({ "Species": null })));

    let batch = RecordNormalizer::default().normalize_batch("MSL35", &rows);

    assert_eq!(batch.rows_seen, 103);
    assert_eq!(batch.records.len(), 100);
    assert_eq!(batch.warnings.len(), 3);
    assert!(batch
        .warnings
        .iter()
        .all(|w| w.severity == Severity::Skipped && w.reason == MalformedRecord::MissingSpecies));
    assert_eq!(
        batch.warnings.iter().map(|w| w.row).collect::<Vec<_>>(),
        vec![10, 50, 102]
    );
}

#[test]
fn test_header_drift_between_releases() {
    let old = row(json!({
        "virus_name": "Phage Lambda",
        "ORDER": "Caudovirales",
        "realm": "Duplodnaviria",
        "kingdom": "Heunggongvirae",
        "phylum": "Uroviricota",
        "class": "Caudoviricetes",
    }));
    let new = row(json!({
        "Current Species Name": "Escherichia virus Lambda",
        "Order": "Caudovirales",
        "Realm": "Duplodnaviria",
        "Kingdom": "Heunggongvirae",
        "Phylum": "Uroviricota",
        "Class": "Caudoviricetes",
    }));

    let normalizer = RecordNormalizer::default();
    let a = normalizer.normalize_batch("MSL34", &[old]);
    let b = normalizer.normalize_batch("MSL35", &[new]);

    assert_eq!(a.records[0].classification, b.records[0].classification);
    assert_eq!(a.records[0].classification.get(TaxonRank::Order), Some("Caudovirales"));
    assert!(a.unmapped_fields.is_empty());
    assert!(b.unmapped_fields.is_empty());
}

#[test]
fn test_large_batch_preserves_row_order() {
    let rows: Vec<RawRow> = (0..5000).map(good_row).collect();
    let batch = RecordNormalizer::default().normalize_batch("MSL38", &rows);

    assert_eq!(batch.records.len(), 5000);
    assert_eq!(batch.records[0].scientific_name, "Escherichia phage 0");
    assert_eq!(batch.records[4999].scientific_name, "Escherichia phage 4999");
}
