//! The promotion engine — drives one evaluation end to end.
//!
//! EXECUTION ORDER (fixed, never reordered):
//!   1. Validate configuration
//!   2. Aggregator  (deposits, then wagering)
//!   3. Merger
//!   4. RuleEvaluator
//!
//! RULES:
//!   - The engine holds no state between runs. Every run rebuilds every
//!     intermediate from the inputs and the configuration.
//!   - Inputs are borrowed and never mutated.
//!   - Errors surface immediately; there is no partial result.

use crate::{
    aggregator::{aggregate, AggregatedMetrics},
    config::PromotionConfig,
    dataset::{Dataset, Source},
    error::PromoResult,
    evaluator::RuleEvaluator,
    event::PromoEvent,
    merger::{merge, metric_columns},
    table::PromotionTable,
};

/// Output of one run: the result table plus the stage events, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionRun {
    pub table:  PromotionTable,
    pub events: Vec<PromoEvent>,
}

pub struct PromotionEngine {
    config: PromotionConfig,
}

impl PromotionEngine {
    /// Build an engine for `config`. Fails if the configuration is invalid.
    pub fn new(config: PromotionConfig) -> PromoResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the full pipeline over one deposits and one wagering dataset.
    pub fn run(&self, deposits: &Dataset, wagering: &Dataset) -> PromoResult<PromotionRun> {
        let cfg = &self.config;
        let mut events = vec![PromoEvent::PipelineStarted {
            deposit_rows:     deposits.len(),
            wager_rows:       wagering.len(),
            aggregation_mode: cfg.aggregation_mode,
            rollover_enabled: cfg.rollover_enabled,
        }];

        let dep = self.aggregate_side(
            deposits,
            &cfg.deposit_user_column,
            Source::Deposits,
            &mut events,
        )?;
        let jug = self.aggregate_side(
            wagering,
            &cfg.wager_user_column,
            Source::Wagering,
            &mut events,
        )?;

        let merged = merge(&dep, &jug)?;
        let deposit_only = merged.iter().filter(|r| !jug.rows.contains_key(&r.user_id)).count();
        let wager_only = merged.iter().filter(|r| !dep.rows.contains_key(&r.user_id)).count();
        log::info!(
            "merger: {} users ({deposit_only} deposits only, {wager_only} wagering only)",
            merged.len()
        );
        events.push(PromoEvent::SummariesMerged {
            users: merged.len(),
            deposit_only,
            wager_only,
        });

        let table = RuleEvaluator::new(cfg).evaluate(merged, metric_columns(&dep, &jug));
        let summary = table.summary();
        log::info!(
            "evaluator: {}/{} eligible, bonus ${:.2} payable, ${:.2} pending rollover",
            summary.eligible_count,
            summary.user_count,
            summary.total_bonus,
            summary.total_pending
        );
        events.push(PromoEvent::RulesEvaluated {
            users:         summary.user_count,
            eligible:      summary.eligible_count,
            total_bonus:   summary.total_bonus,
            total_pending: summary.total_pending,
        });

        Ok(PromotionRun { table, events })
    }

    fn aggregate_side(
        &self,
        dataset: &Dataset,
        user_column: &str,
        source: Source,
        events: &mut Vec<PromoEvent>,
    ) -> PromoResult<AggregatedMetrics> {
        let metrics = aggregate(dataset, user_column, self.config.aggregation_mode, source)?;
        log::info!(
            "aggregator: {} rows of '{}' → {} users, columns {:?} ({})",
            dataset.len(),
            dataset.name,
            metrics.user_count(),
            metrics.columns,
            self.config.aggregation_mode.name()
        );
        events.push(PromoEvent::DatasetAggregated {
            source,
            dataset: dataset.name.clone(),
            users:   metrics.user_count(),
            columns: metrics.columns.clone(),
        });
        Ok(metrics)
    }
}

/// One-shot convenience: validate, run, and return only the table.
pub fn evaluate_promotion(
    deposits: &Dataset,
    wagering: &Dataset,
    config: &PromotionConfig,
) -> PromoResult<PromotionTable> {
    let engine = PromotionEngine::new(config.clone())?;
    Ok(engine.run(deposits, wagering)?.table)
}
