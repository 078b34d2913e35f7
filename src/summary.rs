use crate::schema::RecordStore;
use crate::targets::TargetBook;
use crate::utils::{round_half_up, QuarterWindow};
use chrono::{DateTime, Utc};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    /// Closed-won revenue booked in the anchor's quarter.
    pub revenue: f64,
    /// Resolved quota for the same quarter.
    pub target: f64,
    /// `round(100 * (revenue - target) / target)`, or 0 when there is no target.
    pub gap_percent: i64,
    /// Headline such as "12% to Goal" or "4% above Goal".
    pub message: String,
    pub quarter: QuarterWindow,
}

pub fn revenue_summary(
    store: &RecordStore,
    anchor: &DateTime<Utc>,
    targets: &TargetBook,
) -> RevenueSummary {
    let quarter = QuarterWindow::containing(anchor.date_naive());

    let won_in_quarter: Vec<f64> = store
        .deals
        .iter()
        .filter(|d| d.is_won())
        .filter(|d| d.closed_on().map_or(false, |closed| quarter.contains(closed)))
        .map(|d| d.value())
        .collect();

    debug!(
        "Summary window {}..{}: {} closed-won deals of {} total",
        quarter.start,
        quarter.end,
        won_in_quarter.len(),
        store.deals.len()
    );

    let revenue: f64 = won_in_quarter.iter().sum();
    let target = targets.resolve_quarter(&quarter);
    let gap = revenue - target;

    let gap_percent = if target > 0.0 {
        round_half_up(gap / target * 100.0)
    } else {
        0
    };

    let message = if gap >= 0.0 {
        format!("{}% above Goal", gap_percent.abs())
    } else {
        format!("{}% to Goal", gap_percent.abs())
    };

    RevenueSummary {
        revenue,
        target,
        gap_percent,
        message,
        quarter,
    }
}
