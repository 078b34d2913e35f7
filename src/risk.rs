use crate::config::MetricsPolicy;
use crate::schema::{DealStage, RecordStore};
use crate::utils::{days_between, round_half_up};
use chrono::{DateTime, Utc};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum RiskKind {
    #[serde(rename = "Stalled Pipeline")]
    StalledPipeline,

    #[serde(rename = "Rep Performance")]
    RepPerformance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: RiskKind,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Number of deals behind an aggregate entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    /// Example deal ids, in record order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_rate: Option<i64>,
}

/// Detects stalled pipeline first, then underperforming reps.
pub fn risk_factors(
    store: &RecordStore,
    anchor: &DateTime<Utc>,
    policy: &MetricsPolicy,
) -> Vec<RiskFactor> {
    let mut risks = Vec::new();

    if let Some(stalled) = stalled_pipeline(store, anchor, policy) {
        risks.push(stalled);
    }

    risks.extend(underperforming_reps(store, policy));

    debug!("Risk detection produced {} entries", risks.len());
    risks
}

fn stalled_pipeline(
    store: &RecordStore,
    anchor: &DateTime<Utc>,
    policy: &MetricsPolicy,
) -> Option<RiskFactor> {
    let stalled: Vec<&str> = store
        .deals
        .iter()
        .filter(|d| d.is_open())
        .filter(|d| days_between(&d.created_at, anchor) > policy.stall_threshold_days)
        .map(|d| d.deal_id.as_str())
        .collect();

    if stalled.is_empty() {
        return None;
    }

    Some(RiskFactor {
        id: "stale-deals".to_string(),
        kind: RiskKind::StalledPipeline,
        message: format!(
            "{} deals stuck over {} days",
            stalled.len(),
            policy.stall_threshold_days
        ),
        severity: Some(Severity::Medium),
        count: Some(stalled.len()),
        details: stalled
            .iter()
            .take(policy.stalled_example_limit)
            .map(|id| id.to_string())
            .collect(),
        rep: None,
        win_rate: None,
    })
}

#[derive(Default)]
struct RepTally {
    won: usize,
    total: usize,
}

fn underperforming_reps(store: &RecordStore, policy: &MetricsPolicy) -> Vec<RiskFactor> {
    // first-seen order keeps the output stable across runs
    let mut order: Vec<&str> = Vec::new();
    let mut tallies: HashMap<&str, RepTally> = HashMap::new();

    for deal in store.deals.iter().filter(|d| d.closed_on().is_some()) {
        let tally = tallies.entry(deal.rep_id.as_str()).or_insert_with(|| {
            order.push(deal.rep_id.as_str());
            RepTally::default()
        });
        tally.total += 1;
        if deal.stage == DealStage::ClosedWon {
            tally.won += 1;
        }
    }

    order
        .into_iter()
        .filter_map(|rep_id| {
            let tally = tallies.get(rep_id)?;
            if tally.total < policy.rep_min_closed_deals {
                return None;
            }

            let rate = tally.won as f64 / tally.total as f64 * 100.0;
            if rate >= policy.rep_win_rate_floor {
                return None;
            }

            let name = store.rep_display_name(rep_id);
            let rounded = round_half_up(rate);
            Some(RiskFactor {
                id: format!("rep-{}", name),
                kind: RiskKind::RepPerformance,
                message: format!("Rep {} - Win Rate: {}%", name, rounded),
                severity: Some(Severity::High),
                count: Some(tally.total),
                details: Vec::new(),
                rep: Some(name.to_string()),
                win_rate: Some(rounded),
            })
        })
        .collect()
}
