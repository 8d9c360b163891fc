//! Aggregator — reduces a raw per-transaction dataset to one row per user.
//!
//! RULES:
//!   - The identifier column is chosen by the caller, never inferred.
//!   - Every other numeric column is reduced; non-numeric columns are dropped.
//!   - Reduced columns carry the source prefix (DEP_ / JUG_).
//!   - Empty cells are skipped by every reduction and zero-filled on output.

use crate::{
    config::AggregationMode,
    dataset::{CellValue, Dataset, Source},
    error::{PromoError, PromoResult},
    types::{ColumnName, UserId},
};
use std::collections::BTreeMap;

/// Per-user reduced metrics for one source.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedMetrics {
    pub source:  Source,
    /// Prefixed column names, in the dataset's schema order.
    pub columns: Vec<ColumnName>,
    /// One value per entry of `columns`, keyed by user.
    pub rows:    BTreeMap<UserId, Vec<f64>>,
}

impl AggregatedMetrics {
    /// The designated amount column: the first reduced column.
    pub fn amount_column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }

    pub fn user_count(&self) -> usize {
        self.rows.len()
    }

    pub fn value(&self, user_id: &str, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(user_id).map(|values| values[idx])
    }
}

/// Running reduction over one column for one user.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    value: Option<f64>,
}

impl Accumulator {
    fn push(&mut self, mode: AggregationMode, x: f64) {
        self.value = Some(match (mode, self.value) {
            (_, None) => x,
            (AggregationMode::Sum, Some(acc)) => acc + x,
            (AggregationMode::Max, Some(acc)) => acc.max(x),
            (AggregationMode::Min, Some(acc)) => acc.min(x),
        });
    }

    fn finish(self) -> f64 {
        self.value.unwrap_or(0.0)
    }
}

/// Columns (besides the identifier) whose non-empty cells are all numbers.
fn numeric_columns<'a>(dataset: &'a Dataset, user_column: &str) -> Vec<&'a str> {
    dataset
        .columns
        .iter()
        .filter(|c| c.as_str() != user_column)
        .filter(|c| {
            dataset.records.iter().all(|r| {
                matches!(
                    Dataset::cell(r, c),
                    CellValue::Number(_) | CellValue::Empty
                )
            })
        })
        .map(String::as_str)
        .collect()
}

/// Reduce `dataset` to one row per distinct value of `user_column`.
pub fn aggregate(
    dataset: &Dataset,
    user_column: &str,
    mode: AggregationMode,
    source: Source,
) -> PromoResult<AggregatedMetrics> {
    if !dataset.has_column(user_column) {
        return Err(PromoError::MissingIdentifierColumn {
            dataset: dataset.name.clone(),
            column:  user_column.to_string(),
        });
    }

    let metric_columns = numeric_columns(dataset, user_column);
    if metric_columns.is_empty() {
        return Err(PromoError::NoNumericColumn {
            dataset: dataset.name.clone(),
        });
    }

    let mut groups: BTreeMap<UserId, Vec<Accumulator>> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in &dataset.records {
        let Some(user_id) = Dataset::cell(record, user_column).key() else {
            skipped += 1;
            continue;
        };
        let accs = groups
            .entry(user_id)
            .or_insert_with(|| vec![Accumulator::default(); metric_columns.len()]);
        for (acc, column) in accs.iter_mut().zip(&metric_columns) {
            if let Some(x) = Dataset::cell(record, column).as_number() {
                acc.push(mode, x);
            }
        }
    }

    if skipped > 0 {
        log::debug!(
            "aggregator: skipped {skipped} {} rows with no '{user_column}'",
            dataset.name
        );
    }

    let columns: Vec<ColumnName> = metric_columns
        .iter()
        .map(|c| format!("{}{}", source.prefix(), c))
        .collect();
    let rows = groups
        .into_iter()
        .map(|(user, accs)| (user, accs.into_iter().map(Accumulator::finish).collect()))
        .collect();

    Ok(AggregatedMetrics { source, columns, rows })
}
