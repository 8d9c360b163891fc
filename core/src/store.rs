//! SQLite persistence layer for evaluation runs.
//!
//! RULE: Only store.rs talks to the database.
//! The pipeline never touches the store; callers persist its output.

use crate::{
    config::PromotionConfig,
    error::PromoResult,
    event::{EventLogEntry, PromoEvent},
    table::{PromotionTable, UserSummary},
    types::RunId,
};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;

/// A fresh, unique run identifier.
pub fn new_run_id() -> RunId {
    format!("run-{}", uuid::Uuid::new_v4())
}

pub struct PromoStore {
    conn: Connection,
}

impl PromoStore {
    /// Open (or create) the results database at `path`.
    pub fn open(path: &str) -> PromoResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; in-memory ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PromoResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PromoResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        config: &PromotionConfig,
        version: &str,
    ) -> PromoResult<()> {
        insert_run_row(&self.conn, run_id, config, version)
    }

    /// Persist one whole evaluation atomically: the run row, its events and
    /// its per-user results. On any failure nothing is written.
    pub fn record_run(
        &self,
        run_id: &str,
        config: &PromotionConfig,
        version: &str,
        events: &[PromoEvent],
        table: &PromotionTable,
    ) -> PromoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_run_row(&tx, run_id, config, version)?;
        insert_events(&tx, run_id, events)?;
        insert_results(&tx, run_id, table)?;
        tx.commit()?;
        log::debug!(
            "store: recorded run {run_id} ({} events, {} results)",
            events.len(),
            table.rows.len()
        );
        Ok(())
    }

    pub fn run_config(&self, run_id: &str) -> PromoResult<PromotionConfig> {
        let json: String = self.conn.query_row(
            "SELECT config_json FROM run WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(serde_json::from_str(&json)?)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> PromoResult<()> {
        insert_event_row(&self.conn, entry)
    }

    /// Append every event of one run, numbered from 0 in the given order.
    pub fn append_events(&self, run_id: &str, events: &[PromoEvent]) -> PromoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_events(&tx, run_id, events)?;
        tx.commit()?;
        Ok(())
    }

    pub fn events_for_run(&self, run_id: &str) -> PromoResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, stage, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY seq ASC, id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    seq:        row.get(2)?,
                    stage:      row.get(3)?,
                    event_type: row.get(4)?,
                    payload:    row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ── Results ────────────────────────────────────────────────

    pub fn save_results(&self, run_id: &str, table: &PromotionTable) -> PromoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_results(&tx, run_id, table)?;
        tx.commit()?;
        log::debug!("store: saved {} results for run {run_id}", table.rows.len());
        Ok(())
    }

    pub fn results_for_run(&self, run_id: &str) -> PromoResult<Vec<UserSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, deposit_amount, wagered_amount, eligible,
                    bonus_amount, bonus_pending_rollover, metrics_json
             FROM user_result WHERE run_id = ?1
             ORDER BY user_id ASC",
        )?;
        let raw = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, i64>(3)? != 0,
                    row.get::<_, f64>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(raw.len());
        for (user_id, deposit, wagered, eligible, bonus, pending, metrics_json) in raw {
            let metrics: BTreeMap<String, f64> = serde_json::from_str(&metrics_json)?;
            rows.push(UserSummary {
                user_id,
                deposit_amount: deposit,
                wagered_amount: wagered,
                eligible,
                bonus_amount: bonus,
                bonus_pending_rollover: pending,
                metrics,
            });
        }
        Ok(rows)
    }

    pub fn result_count(&self, run_id: &str) -> PromoResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM user_result WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?)
    }

    pub fn eligible_count(&self, run_id: &str) -> PromoResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM user_result WHERE run_id = ?1 AND eligible = 1",
            params![run_id],
            |row| row.get(0),
        )?)
    }

    pub fn total_bonus(&self, run_id: &str) -> PromoResult<f64> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(bonus_amount), 0.0) FROM user_result WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?)
    }

    pub fn total_pending(&self, run_id: &str) -> PromoResult<f64> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(bonus_pending_rollover), 0.0) FROM user_result WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?)
    }
}

// ── Row writers ────────────────────────────────────────────────
// Shared by the single-purpose methods and `record_run`; the caller owns
// the transaction.

fn insert_run_row(
    conn: &Connection,
    run_id: &str,
    config: &PromotionConfig,
    version: &str,
) -> PromoResult<()> {
    let config_json = serde_json::to_string(config)?;
    conn.execute(
        "INSERT INTO run (run_id, version, config_json, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![run_id, version, config_json, chrono::Utc::now().timestamp()],
    )?;
    Ok(())
}

fn insert_event_row(conn: &Connection, entry: &EventLogEntry) -> PromoResult<()> {
    conn.execute(
        "INSERT INTO event_log (run_id, seq, stage, event_type, payload)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.run_id,
            entry.seq,
            entry.stage,
            entry.event_type,
            entry.payload,
        ],
    )?;
    Ok(())
}

fn insert_events(conn: &Connection, run_id: &str, events: &[PromoEvent]) -> PromoResult<()> {
    for (seq, event) in events.iter().enumerate() {
        let entry = EventLogEntry::from_event(run_id, seq as u32, event)?;
        insert_event_row(conn, &entry)?;
    }
    Ok(())
}

fn insert_results(conn: &Connection, run_id: &str, table: &PromotionTable) -> PromoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO user_result (
            run_id, user_id, deposit_amount, wagered_amount,
            eligible, bonus_amount, bonus_pending_rollover, metrics_json
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for row in &table.rows {
        let metrics_json = serde_json::to_string(&row.metrics)?;
        stmt.execute(params![
            run_id,
            row.user_id,
            row.deposit_amount,
            row.wagered_amount,
            if row.eligible { 1i64 } else { 0i64 },
            row.bonus_amount,
            row.bonus_pending_rollover,
            metrics_json,
        ])?;
    }
    Ok(())
}
