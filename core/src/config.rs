use crate::error::{PromoError, PromoResult};
use serde::{Deserialize, Serialize};

/// Reduction applied across one user's raw transaction rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    #[default]
    #[serde(alias = "Suma", alias = "Sum")]
    Sum,
    #[serde(alias = "Máximo", alias = "Maximo", alias = "Max")]
    Max,
    #[serde(alias = "Mínimo", alias = "Minimo", alias = "Min")]
    Min,
}

impl AggregationMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Max => "max",
            Self::Min => "min",
        }
    }
}

impl std::str::FromStr for AggregationMode {
    type Err = PromoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sum" | "suma" => Ok(Self::Sum),
            "max" | "máximo" | "maximo" => Ok(Self::Max),
            "min" | "mínimo" | "minimo" => Ok(Self::Min),
            other => Err(PromoError::InvalidConfiguration {
                field:  "aggregation_mode".into(),
                reason: format!("must be one of sum, max, min (got '{other}')"),
            }),
        }
    }
}

// ── Promotion parameters ───────────────────────────────────────────

/// The one promotion shape: deposit threshold + wager threshold +
/// percentage bonus with a cap, optionally withheld behind rollover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionConfig {
    pub deposit_min:         f64,
    pub wagered_min:         f64,
    /// Percentage of the deposit, e.g. 10.0 for 10%.
    pub bonus_percent:       f64,
    pub bonus_cap:           f64,
    pub aggregation_mode:    AggregationMode,
    pub rollover_enabled:    bool,
    pub deposit_user_column: String,
    pub wager_user_column:   String,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            deposit_min:         1000.0,
            wagered_min:         0.0,
            bonus_percent:       10.0,
            bonus_cap:           5000.0,
            aggregation_mode:    AggregationMode::Sum,
            rollover_enabled:    false,
            deposit_user_column: "usuario".into(),
            wager_user_column:   "usuario".into(),
        }
    }
}

impl PromotionConfig {
    /// Load from a JSON file. Fields missing from the file keep their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PromotionConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Reject negative or non-finite amounts and blank identifier columns.
    pub fn validate(&self) -> PromoResult<()> {
        let amounts = [
            ("deposit_min", self.deposit_min),
            ("wagered_min", self.wagered_min),
            ("bonus_percent", self.bonus_percent),
            ("bonus_cap", self.bonus_cap),
        ];
        for (field, value) in amounts {
            if !value.is_finite() {
                return Err(PromoError::InvalidConfiguration {
                    field:  field.into(),
                    reason: format!("must be a finite number (got {value})"),
                });
            }
            if value < 0.0 {
                return Err(PromoError::InvalidConfiguration {
                    field:  field.into(),
                    reason: format!("must be non-negative (got {value})"),
                });
            }
        }

        let columns = [
            ("deposit_user_column", &self.deposit_user_column),
            ("wager_user_column", &self.wager_user_column),
        ];
        for (field, column) in columns {
            if column.trim().is_empty() {
                return Err(PromoError::InvalidConfiguration {
                    field:  field.into(),
                    reason: "must name a column".into(),
                });
            }
        }
        Ok(())
    }

    /// Config with hardcoded values for use in tests.
    pub fn default_test() -> Self {
        Self {
            deposit_min:         1000.0,
            wagered_min:         0.0,
            bonus_percent:       10.0,
            bonus_cap:           5000.0,
            aggregation_mode:    AggregationMode::Sum,
            rollover_enabled:    false,
            deposit_user_column: "user".into(),
            wager_user_column:   "user".into(),
        }
    }
}
