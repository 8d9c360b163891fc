//! Rule evaluator — applies the promotion to each merged row.
//!
//!   eligible  = deposit ≥ deposit_min AND wagered ≥ wagered_min
//!   raw_bonus = eligible ? min(deposit × percent / 100, cap) : 0
//!
//! With rollover enabled the raw bonus is withheld into the pending field
//! and nothing is payable. Releasing a withheld bonus is not modelled here.

use crate::{
    config::PromotionConfig,
    merger::MergedRow,
    table::{PromotionTable, UserSummary},
    types::ColumnName,
};

pub struct RuleEvaluator<'a> {
    config: &'a PromotionConfig,
}

impl<'a> RuleEvaluator<'a> {
    pub fn new(config: &'a PromotionConfig) -> Self {
        Self { config }
    }

    pub fn is_eligible(&self, deposit_amount: f64, wagered_amount: f64) -> bool {
        deposit_amount >= self.config.deposit_min && wagered_amount >= self.config.wagered_min
    }

    /// Bonus earned before rollover is considered. Cap applies after the percentage.
    pub fn raw_bonus(&self, deposit_amount: f64, eligible: bool) -> f64 {
        if !eligible {
            return 0.0;
        }
        let earned = deposit_amount * (self.config.bonus_percent / 100.0);
        earned.min(self.config.bonus_cap)
    }

    pub fn evaluate_row(&self, row: MergedRow) -> UserSummary {
        let eligible = self.is_eligible(row.deposit_amount, row.wagered_amount);
        let raw_bonus = self.raw_bonus(row.deposit_amount, eligible);

        let (bonus_amount, bonus_pending_rollover) = if self.config.rollover_enabled {
            (0.0, Some(raw_bonus))
        } else {
            (raw_bonus, None)
        };

        UserSummary {
            user_id: row.user_id,
            deposit_amount: row.deposit_amount,
            wagered_amount: row.wagered_amount,
            eligible,
            bonus_amount,
            bonus_pending_rollover,
            metrics: row.metrics,
        }
    }

    pub fn evaluate(&self, rows: Vec<MergedRow>, metric_columns: Vec<ColumnName>) -> PromotionTable {
        PromotionTable {
            rollover_enabled: self.config.rollover_enabled,
            metric_columns,
            rows: rows.into_iter().map(|r| self.evaluate_row(r)).collect(),
        }
    }
}
