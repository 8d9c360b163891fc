//! Merger — outer join of the two per-user aggregates.
//!
//! A user present on only one side gets 0 for every column of the other
//! side. Output order is ascending user identifier.

use crate::{
    aggregator::AggregatedMetrics,
    error::{PromoError, PromoResult},
    types::{ColumnName, UserId},
};
use std::collections::{BTreeMap, BTreeSet};

/// One joined row, before any rule is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub user_id:        UserId,
    pub deposit_amount: f64,
    pub wagered_amount: f64,
    /// Every reduced column of both sources, zero-filled.
    pub metrics:        BTreeMap<ColumnName, f64>,
}

fn require_amount_column(side: &AggregatedMetrics) -> PromoResult<()> {
    if side.amount_column().is_none() {
        return Err(PromoError::NoNumericColumn {
            dataset: side.source.name().to_string(),
        });
    }
    Ok(())
}

/// Copy one side's columns for `user_id` into `metrics` and return its amount.
fn fill_metrics(
    side: &AggregatedMetrics,
    user_id: &str,
    metrics: &mut BTreeMap<ColumnName, f64>,
) -> f64 {
    let values = side.rows.get(user_id);
    for (i, column) in side.columns.iter().enumerate() {
        let v = values.map(|vals| vals[i]).unwrap_or(0.0);
        metrics.insert(column.clone(), v);
    }
    values.map(|vals| vals[0]).unwrap_or(0.0)
}

/// Join deposits and wagering on user identifier.
pub fn merge(
    deposits: &AggregatedMetrics,
    wagering: &AggregatedMetrics,
) -> PromoResult<Vec<MergedRow>> {
    require_amount_column(deposits)?;
    require_amount_column(wagering)?;

    let users: BTreeSet<&UserId> = deposits.rows.keys().chain(wagering.rows.keys()).collect();

    let rows = users
        .into_iter()
        .map(|user_id| {
            let mut metrics = BTreeMap::new();
            let deposit_amount = fill_metrics(deposits, user_id, &mut metrics);
            let wagered_amount = fill_metrics(wagering, user_id, &mut metrics);
            MergedRow {
                user_id: user_id.to_string(),
                deposit_amount,
                wagered_amount,
                metrics,
            }
        })
        .collect();

    Ok(rows)
}

/// Column names a merged row carries in `metrics`, deposits first.
pub fn metric_columns(
    deposits: &AggregatedMetrics,
    wagering: &AggregatedMetrics,
) -> Vec<ColumnName> {
    deposits
        .columns
        .iter()
        .chain(wagering.columns.iter())
        .cloned()
        .collect()
}
