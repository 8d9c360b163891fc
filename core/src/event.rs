//! Pipeline events — one per stage, in execution order.
//!
//! The core never persists events itself. Callers log them or hand them
//! to the store.

use crate::{config::AggregationMode, dataset::Source, types::RunId};
use serde::{Deserialize, Serialize};

/// Every event emitted during one evaluation.
/// Variants are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromoEvent {
    PipelineStarted {
        deposit_rows:     usize,
        wager_rows:       usize,
        aggregation_mode: AggregationMode,
        rollover_enabled: bool,
    },
    DatasetAggregated {
        source:  Source,
        dataset: String,
        users:   usize,
        columns: Vec<String>,
    },
    SummariesMerged {
        users:        usize,
        deposit_only: usize,
        wager_only:   usize,
    },
    RulesEvaluated {
        users:         usize,
        eligible:      usize,
        total_bonus:   f64,
        total_pending: f64,
    },
}

impl PromoEvent {
    /// Stable name for the event_type column of the event log.
    pub fn type_name(&self) -> &'static str {
        match self {
            PromoEvent::PipelineStarted { .. }   => "pipeline_started",
            PromoEvent::DatasetAggregated { .. } => "dataset_aggregated",
            PromoEvent::SummariesMerged { .. }   => "summaries_merged",
            PromoEvent::RulesEvaluated { .. }    => "rules_evaluated",
        }
    }

    /// The pipeline stage that emitted this event.
    pub fn stage(&self) -> &'static str {
        match self {
            PromoEvent::PipelineStarted { .. }   => "engine",
            PromoEvent::DatasetAggregated { .. } => "aggregator",
            PromoEvent::SummariesMerged { .. }   => "merger",
            PromoEvent::RulesEvaluated { .. }    => "evaluator",
        }
    }
}

/// A row in the persisted event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub seq:        u32,
    pub stage:      String,
    pub event_type: String,
    pub payload:    String,
}

impl EventLogEntry {
    pub fn from_event(run_id: &str, seq: u32, event: &PromoEvent) -> serde_json::Result<Self> {
        Ok(Self {
            id:         None,
            run_id:     run_id.to_string(),
            seq,
            stage:      event.stage().to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        })
    }
}
