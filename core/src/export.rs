//! Export — CSV and JSON renderings of the result table.
//!
//! Column order follows `PromotionTable::column_names`. Spreadsheet
//! formats are left to downstream tooling.

use crate::{
    error::{PromoError, PromoResult},
    table::PromotionTable,
};
use std::path::Path;

fn money(v: f64) -> String {
    format!("{v:.2}")
}

/// Render the table as CSV. The pending column is only present with rollover.
pub fn to_csv(table: &PromotionTable) -> PromoResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(table.column_names())?;

    for row in &table.rows {
        let mut record = vec![
            row.user_id.clone(),
            money(row.deposit_amount),
            money(row.wagered_amount),
            money(row.bonus_amount),
            row.eligible.to_string(),
        ];
        if table.rollover_enabled {
            record.push(row.bonus_pending_rollover.map(money).unwrap_or_default());
        }
        for column in &table.metric_columns {
            record.push(money(row.metrics.get(column).copied().unwrap_or(0.0)));
        }
        wtr.write_record(&record)?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| PromoError::Io(e.into_error()))?;
    let text = String::from_utf8(data)
        .map_err(|e| anyhow::anyhow!("CSV output is not valid UTF-8: {e}"))?;
    Ok(text)
}

/// Serialize the table to pretty JSON.
pub fn to_json(table: &PromotionTable) -> PromoResult<String> {
    Ok(serde_json::to_string_pretty(table)?)
}

pub fn write_csv(table: &PromotionTable, path: impl AsRef<Path>) -> PromoResult<()> {
    std::fs::write(path, to_csv(table)?)?;
    Ok(())
}

pub fn write_json(table: &PromotionTable, path: impl AsRef<Path>) -> PromoResult<()> {
    std::fs::write(path, to_json(table)?)?;
    Ok(())
}
