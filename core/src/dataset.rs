//! Raw tabular input — one dataset per transaction source.
//!
//! RULE: Datasets are read-only once built. The pipeline borrows them and
//! never mutates a record.

use crate::types::{ColumnName, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single cell of a raw transaction row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

/// Markers read as a missing value, matching pandas' default `na_values`.
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl CellValue {
    /// Classify a raw textual cell: blank or a missing marker → Empty,
    /// parseable → Number, else Text.
    ///
    /// Infinities stay `Number`; `ingest` rejects them with a located error.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_nan() => CellValue::Empty,
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The grouping key for an identifier cell. None for a missing value.
    pub fn key(&self) -> Option<UserId> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) if s.trim().is_empty() => None,
            CellValue::Text(s) => Some(s.trim().to_string()),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            CellValue::Number(n) => Some(n.to_string()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// One raw row: column name → value. Columns absent from the map are Empty.
pub type TransactionRecord = BTreeMap<ColumnName, CellValue>;

/// A named table of transaction rows with a fixed column schema.
///
/// The schema is kept separately from the records so a header-only input
/// still knows its columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub name:    String,
    pub columns: Vec<ColumnName>,
    pub records: Vec<TransactionRecord>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name:    name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            records: Vec::new(),
        }
    }

    /// Append a row given positionally, in schema order.
    /// Extra trailing values are ignored; missing ones are Empty.
    pub fn push_row(&mut self, values: Vec<CellValue>) {
        let mut record = TransactionRecord::new();
        let mut values = values.into_iter();
        for column in &self.columns {
            let value = values.next().unwrap_or(CellValue::Empty);
            record.insert(column.clone(), value);
        }
        self.records.push(record);
    }

    pub fn with_row(mut self, values: Vec<CellValue>) -> Self {
        self.push_row(values);
        self
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// The cell at (record, column), treating an absent key as Empty.
    pub fn cell<'a>(record: &'a TransactionRecord, column: &str) -> &'a CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        record.get(column).unwrap_or(EMPTY)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Which side of the join a dataset feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Deposits,
    Wagering,
}

impl Source {
    /// Namespace prefix for this source's reduced columns.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Deposits => "DEP_",
            Self::Wagering => "JUG_",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Deposits => "deposits",
            Self::Wagering => "wagering",
        }
    }
}
