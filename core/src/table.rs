//! The per-user result table and its logical output schema.

use crate::types::{ColumnName, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const USER_COLUMN: &str = "usuario";
pub const DEPOSIT_COLUMN: &str = "DEPOSITO";
pub const WAGERED_COLUMN: &str = "JUGADO";
pub const BONUS_COLUMN: &str = "BONO";
pub const ELIGIBLE_COLUMN: &str = "BONIFICABLE";
pub const PENDING_ROLLOVER_COLUMN: &str = "BONO_CON_ROLLOVER";

/// Final eligibility and bonus decision for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id:                UserId,
    pub deposit_amount:         f64,
    pub wagered_amount:         f64,
    pub eligible:               bool,
    /// Immediately payable bonus. Always 0 when rollover is enabled.
    pub bonus_amount:           f64,
    /// Withheld bonus. Present only when rollover is enabled.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bonus_pending_rollover: Option<f64>,
    pub metrics:                BTreeMap<ColumnName, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionTable {
    pub rollover_enabled: bool,
    /// Retained DEP_* and JUG_* columns, deposits first.
    pub metric_columns:   Vec<ColumnName>,
    pub rows:             Vec<UserSummary>,
}

impl PromotionTable {
    /// Output column order for exporters.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = [
            USER_COLUMN,
            DEPOSIT_COLUMN,
            WAGERED_COLUMN,
            BONUS_COLUMN,
            ELIGIBLE_COLUMN,
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        if self.rollover_enabled {
            names.push(PENDING_ROLLOVER_COLUMN.to_string());
        }
        names.extend(self.metric_columns.iter().cloned());
        names
    }

    pub fn get(&self, user_id: &str) -> Option<&UserSummary> {
        self.rows.iter().find(|r| r.user_id == user_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> PromotionSummary {
        PromotionSummary {
            user_count:     self.rows.len(),
            eligible_count: self.rows.iter().filter(|r| r.eligible).count(),
            total_bonus:    self.rows.iter().map(|r| r.bonus_amount).sum(),
            total_pending:  self
                .rows
                .iter()
                .filter_map(|r| r.bonus_pending_rollover)
                .sum(),
        }
    }
}

/// Totals an operator checks before paying out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionSummary {
    pub user_count:     usize,
    pub eligible_count: usize,
    pub total_bonus:    f64,
    pub total_pending:  f64,
}
