//! CSV ingest — turns a delimited file into a `Dataset`.
//!
//! The header row is the schema. Every cell is classified with
//! `CellValue::parse`; short rows are padded with Empty. Infinite amounts
//! are rejected rather than carried into the bonus arithmetic.

use crate::{
    dataset::{CellValue, Dataset},
    error::{PromoError, PromoResult},
};
use std::{io::Read, path::Path};

pub fn read_csv<R: Read>(reader: R, name: &str) -> PromoResult<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut dataset = Dataset {
        name:    name.to_string(),
        columns: headers,
        records: Vec::new(),
    };

    for record in rdr.records() {
        let record = record?;
        let cells: Vec<CellValue> = record.iter().map(CellValue::parse).collect();
        let non_finite = cells
            .iter()
            .position(|c| c.as_number().is_some_and(|n| !n.is_finite()));
        if let Some(idx) = non_finite {
            return Err(PromoError::NonFiniteValue {
                dataset: name.to_string(),
                column:  dataset.columns.get(idx).cloned().unwrap_or_else(|| format!("#{idx}")),
                line:    record.position().map_or(0, |p| p.line()),
            });
        }
        dataset.push_row(cells);
    }

    log::debug!(
        "ingest: '{name}' loaded {} rows, columns {:?}",
        dataset.len(),
        dataset.columns
    );
    Ok(dataset)
}

/// Load a CSV file; the dataset is named after the file stem.
pub fn load_csv(path: impl AsRef<Path>) -> PromoResult<Dataset> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file = std::fs::File::open(path)?;
    read_csv(file, &name)
}
