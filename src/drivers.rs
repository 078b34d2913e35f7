use crate::schema::{DealStage, RecordStore};
use crate::utils::{days_between, last_twelve_months_start, round_half_up};
use chrono::{DateTime, Utc};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverMetrics {
    /// Total value of every open deal, regardless of age.
    pub pipeline_value: f64,
    /// Percent of last-twelve-month closes that were won.
    pub win_rate: i64,
    pub avg_deal_size: i64,
    pub sales_cycle_days: i64,
}

pub fn driver_metrics(store: &RecordStore, anchor: &DateTime<Utc>) -> DriverMetrics {
    let open: Vec<f64> = store
        .deals
        .iter()
        .filter(|d| d.is_open())
        .map(|d| d.value())
        .collect();
    let pipeline_value: f64 = open.iter().sum();

    let window_start = last_twelve_months_start(anchor);

    let mut won_count = 0usize;
    let mut lost_count = 0usize;
    let mut won_amount = 0.0;
    let mut won_cycle_days = 0i64;

    for deal in &store.deals {
        let Some(closed) = deal.closed_on() else {
            continue;
        };
        if *closed < window_start {
            continue;
        }

        match deal.stage {
            DealStage::ClosedWon => {
                won_count += 1;
                won_amount += deal.value();
                won_cycle_days += days_between(&deal.created_at, closed);
            }
            DealStage::ClosedLost => lost_count += 1,
            _ => {}
        }
    }

    debug!(
        "Drivers: {} open deals, LTM from {} has {} won / {} lost",
        open.len(),
        window_start,
        won_count,
        lost_count
    );

    let closed_count = won_count + lost_count;
    let win_rate = ratio(won_count as f64 * 100.0, closed_count);
    let avg_deal_size = ratio(won_amount, won_count);
    let sales_cycle_days = ratio(won_cycle_days as f64, won_count);

    DriverMetrics {
        pipeline_value,
        win_rate: round_half_up(win_rate),
        avg_deal_size: round_half_up(avg_deal_size),
        sales_cycle_days: round_half_up(sales_cycle_days),
    }
}

fn ratio(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
