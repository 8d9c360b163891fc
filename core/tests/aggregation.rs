//! Aggregator tests — one row per user, per source.

use promo_core::{
    aggregator::aggregate,
    config::AggregationMode,
    dataset::{CellValue, Dataset, Source},
    error::PromoError,
};

fn deposits() -> Dataset {
    Dataset::new("depositos", &["user", "amount", "fee", "channel"])
        .with_row(vec!["A".into(), 600.0.into(), 5.0.into(), "web".into()])
        .with_row(vec!["A".into(), 500.0.into(), 2.0.into(), "app".into()])
        .with_row(vec!["B".into(), 40.0.into(), 1.0.into(), "web".into()])
        .with_row(vec!["C".into(), 2000.0.into(), 0.0.into(), "cashier".into()])
}

#[test]
fn sum_mode_adds_every_row_of_a_user() {
    let agg = aggregate(&deposits(), "user", AggregationMode::Sum, Source::Deposits).unwrap();

    assert_eq!(agg.user_count(), 3);
    assert_eq!(agg.value("A", "DEP_amount"), Some(1100.0));
    assert_eq!(agg.value("A", "DEP_fee"), Some(7.0));
    assert_eq!(agg.value("B", "DEP_amount"), Some(40.0));
}

#[test]
fn max_and_min_modes_are_honored() {
    let max = aggregate(&deposits(), "user", AggregationMode::Max, Source::Deposits).unwrap();
    let min = aggregate(&deposits(), "user", AggregationMode::Min, Source::Deposits).unwrap();

    assert_eq!(max.value("A", "DEP_amount"), Some(600.0));
    assert_eq!(min.value("A", "DEP_amount"), Some(500.0));
    // Single-row users reduce to that row under every mode.
    assert_eq!(max.value("C", "DEP_amount"), Some(2000.0));
    assert_eq!(min.value("C", "DEP_amount"), Some(2000.0));
}

#[test]
fn columns_are_prefixed_per_source_and_text_is_dropped() {
    let dep = aggregate(&deposits(), "user", AggregationMode::Sum, Source::Deposits).unwrap();
    assert_eq!(dep.columns, vec!["DEP_amount", "DEP_fee"]);
    assert_eq!(dep.amount_column(), Some("DEP_amount"));

    let jug = aggregate(&deposits(), "user", AggregationMode::Sum, Source::Wagering).unwrap();
    assert_eq!(jug.columns, vec!["JUG_amount", "JUG_fee"]);
}

#[test]
fn missing_identifier_column_fails_fast() {
    let err = aggregate(&deposits(), "usuario", AggregationMode::Sum, Source::Deposits)
        .expect_err("unknown identifier column must fail");

    match err {
        PromoError::MissingIdentifierColumn { dataset, column } => {
            assert_eq!(dataset, "depositos");
            assert_eq!(column, "usuario");
        }
        other => panic!("Expected MissingIdentifierColumn, got {other:?}"),
    }
}

#[test]
fn dataset_without_numeric_columns_is_rejected() {
    let ds = Dataset::new("jugado", &["user", "game"])
        .with_row(vec!["A".into(), "slots".into()])
        .with_row(vec!["B".into(), "poker".into()]);

    let err = aggregate(&ds, "user", AggregationMode::Sum, Source::Wagering).unwrap_err();
    assert!(
        matches!(err, PromoError::NoNumericColumn { ref dataset } if dataset == "jugado"),
        "Expected NoNumericColumn, got {err:?}"
    );
}

#[test]
fn identifier_only_dataset_is_rejected() {
    let ds = Dataset::new("jugado", &["user"]).with_row(vec![7.0.into()]);
    let err = aggregate(&ds, "user", AggregationMode::Sum, Source::Wagering).unwrap_err();
    assert!(matches!(err, PromoError::NoNumericColumn { .. }));
}

#[test]
fn empty_dataset_yields_empty_set_with_schema_columns() {
    let ds = Dataset::new("depositos", &["user", "amount"]);
    let agg = aggregate(&ds, "user", AggregationMode::Sum, Source::Deposits).unwrap();

    assert_eq!(agg.user_count(), 0);
    assert_eq!(agg.columns, vec!["DEP_amount"]);
}

#[test]
fn rows_without_identifier_are_skipped() {
    let ds = Dataset::new("depositos", &["user", "amount"])
        .with_row(vec!["A".into(), 10.0.into()])
        .with_row(vec![CellValue::Empty, 999.0.into()])
        .with_row(vec!["  ".into(), 999.0.into()]);

    let agg = aggregate(&ds, "user", AggregationMode::Sum, Source::Deposits).unwrap();
    assert_eq!(agg.user_count(), 1);
    assert_eq!(agg.value("A", "DEP_amount"), Some(10.0));
}

#[test]
fn empty_cells_are_skipped_and_zero_filled() {
    let ds = Dataset::new("depositos", &["user", "amount"])
        .with_row(vec!["A".into(), CellValue::Empty])
        .with_row(vec!["A".into(), 30.0.into()])
        .with_row(vec!["B".into(), CellValue::Empty]);

    let max = aggregate(&ds, "user", AggregationMode::Max, Source::Deposits).unwrap();
    assert_eq!(max.value("A", "DEP_amount"), Some(30.0));
    assert_eq!(max.value("B", "DEP_amount"), Some(0.0));

    let sum = aggregate(&ds, "user", AggregationMode::Sum, Source::Deposits).unwrap();
    assert_eq!(sum.value("B", "DEP_amount"), Some(0.0));
}

#[test]
fn numeric_identifiers_group_by_whole_number_text() {
    let ds = Dataset::new("depositos", &["id", "amount"])
        .with_row(vec![42i64.into(), 1.0.into()])
        .with_row(vec![42.0.into(), 2.0.into()])
        .with_row(vec!["42".into(), 4.0.into()]);

    let agg = aggregate(&ds, "id", AggregationMode::Sum, Source::Deposits).unwrap();
    assert_eq!(agg.user_count(), 1, "42, 42.0 and \"42\" are the same user");
    assert_eq!(agg.value("42", "DEP_amount"), Some(7.0));
}

#[test]
fn input_dataset_is_left_untouched() {
    let ds = deposits();
    let before = ds.clone();
    aggregate(&ds, "user", AggregationMode::Max, Source::Deposits).unwrap();
    assert_eq!(ds, before);
}
