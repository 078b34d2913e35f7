use crate::error::{Result, SalesMetricsError};
use crate::utils::MonthKey;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Multiplier applied to last year's quota when a month has no target of its own.
///
/// This is a projection policy, not a measured figure.
pub const PRIOR_YEAR_GROWTH_FACTOR: f64 = 1.10;

pub const DEFAULT_STALL_THRESHOLD_DAYS: i64 = 90;
pub const DEFAULT_STALLED_EXAMPLE_LIMIT: usize = 3;
pub const DEFAULT_REP_MIN_CLOSED_DEALS: usize = 5;
pub const DEFAULT_REP_WIN_RATE_FLOOR: f64 = 20.0;
pub const DEFAULT_TREND_MONTHS: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum RecommendationStrategy {
    #[default]
    #[schemars(description = "Always return the fixed advisory list")]
    Static,

    #[schemars(
        description = "One recommendation per risk category present, falling back to the fixed list when nothing is at risk"
    )]
    RiskDriven,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MetricsPolicy {
    #[schemars(description = "Open deals strictly older than this many days are stalled")]
    pub stall_threshold_days: i64,

    #[schemars(description = "How many stalled deal ids to list as examples")]
    pub stalled_example_limit: usize,

    #[schemars(description = "Minimum closed deals before a rep's win rate is judged")]
    pub rep_min_closed_deals: usize,

    #[schemars(description = "Reps with a win rate (percent) strictly below this are flagged")]
    pub rep_win_rate_floor: f64,

    #[schemars(
        description = "Multiplier applied to the prior year's quota when a month has no target"
    )]
    pub target_growth_factor: f64,

    #[schemars(description = "Number of consecutive months in the trend series")]
    pub trend_months: usize,

    #[schemars(
        description = "First month of the trend series. When absent the series starts at the quarter before the anchor's quarter."
    )]
    pub trend_origin: Option<MonthKey>,

    pub recommendations: RecommendationStrategy,
}

impl Default for MetricsPolicy {
    fn default() -> Self {
        Self {
            stall_threshold_days: DEFAULT_STALL_THRESHOLD_DAYS,
            stalled_example_limit: DEFAULT_STALLED_EXAMPLE_LIMIT,
            rep_min_closed_deals: DEFAULT_REP_MIN_CLOSED_DEALS,
            rep_win_rate_floor: DEFAULT_REP_WIN_RATE_FLOOR,
            target_growth_factor: PRIOR_YEAR_GROWTH_FACTOR,
            trend_months: DEFAULT_TREND_MONTHS,
            trend_origin: None,
            recommendations: RecommendationStrategy::Static,
        }
    }
}

impl MetricsPolicy {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stall_threshold_days <= 0 {
            return Err(invalid(
                "stall_threshold_days",
                format!("must be positive, got {}", self.stall_threshold_days),
            ));
        }

        if self.stalled_example_limit == 0 {
            return Err(invalid("stalled_example_limit", "must be at least 1".to_string()));
        }

        if self.rep_min_closed_deals == 0 {
            return Err(invalid("rep_min_closed_deals", "must be at least 1".to_string()));
        }

        if !(0.0..=100.0).contains(&self.rep_win_rate_floor) {
            return Err(invalid(
                "rep_win_rate_floor",
                format!("must be between 0 and 100, got {}", self.rep_win_rate_floor),
            ));
        }

        if !self.target_growth_factor.is_finite() || self.target_growth_factor <= 0.0 {
            return Err(invalid(
                "target_growth_factor",
                format!("must be a positive number, got {}", self.target_growth_factor),
            ));
        }

        if self.trend_months == 0 {
            return Err(invalid("trend_months", "must be at least 1".to_string()));
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(MetricsPolicy)
    }
}

fn invalid(field: &str, details: String) -> SalesMetricsError {
    SalesMetricsError::InvalidPolicy {
        field: field.to_string(),
        details,
    }
}
