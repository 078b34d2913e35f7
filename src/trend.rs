use crate::config::MetricsPolicy;
use crate::schema::RecordStore;
use crate::targets::TargetBook;
use crate::utils::{fiscal_quarter_start, round_half_up, MonthKey};
use chrono::{DateTime, Months, Utc};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TrendPoint {
    /// Short English month name, e.g. "Oct".
    pub month: String,
    pub revenue: i64,
    pub target: i64,
}

/// First month of the trend window.
///
/// An explicit origin wins. Otherwise the window starts one quarter before the
/// anchor's quarter, so a six month series ends with the anchor's quarter.
pub fn trend_origin(anchor: &DateTime<Utc>, policy: &MetricsPolicy) -> MonthKey {
    if let Some(origin) = policy.trend_origin {
        return origin;
    }

    let quarter_start = fiscal_quarter_start(anchor.date_naive());
    let origin = quarter_start
        .checked_sub_months(Months::new(3))
        .unwrap_or(quarter_start);
    MonthKey::containing(origin)
}

pub fn trend_months(anchor: &DateTime<Utc>, policy: &MetricsPolicy) -> Vec<MonthKey> {
    let origin = trend_origin(anchor, policy);
    std::iter::successors(Some(origin), |m| m.next())
        .take(policy.trend_months)
        .collect()
}

pub fn trend_series(
    store: &RecordStore,
    anchor: &DateTime<Utc>,
    policy: &MetricsPolicy,
    targets: &TargetBook,
) -> Vec<TrendPoint> {
    let months = trend_months(anchor, policy);
    debug!(
        "Trend window: {} months from {}",
        months.len(),
        months.first().map(|m| m.to_string()).unwrap_or_default()
    );

    months
        .into_iter()
        .map(|month| {
            let revenue: f64 = store
                .deals
                .iter()
                .filter(|d| d.is_won())
                .filter(|d| d.closed_on().map_or(false, |closed| month.contains(closed)))
                .map(|d| d.value())
                .sum();

            TrendPoint {
                month: month.label().to_string(),
                revenue: round_half_up(revenue),
                target: round_half_up(targets.resolve(month)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Deal, DealStage, Target};
    use crate::utils::parse_timestamp;

    fn anchor() -> DateTime<Utc> {
        parse_timestamp("2026-02-05").unwrap()
    }

    fn won(id: &str, amount: f64, closed: &str) -> Deal {
        Deal {
            deal_id: id.to_string(),
            amount: Some(amount),
            stage: DealStage::ClosedWon,
            rep_id: "R01".to_string(),
            account_id: None,
            created_at: parse_timestamp("2025-01-01").unwrap(),
            closed_at: Some(parse_timestamp(closed).unwrap()),
        }
    }

    #[test]
    fn test_default_window_ends_with_anchor_quarter() {
        let labels: Vec<String> = trend_months(&anchor(), &MetricsPolicy::default())
            .iter()
            .map(|m| m.to_string())
            .collect();
        assert_eq!(
            labels,
            vec!["2025-10", "2025-11", "2025-12", "2026-01", "2026-02", "2026-03"]
        );
    }

    #[test]
    fn test_explicit_origin() {
        let policy = MetricsPolicy {
            trend_origin: Some("2025-05".parse().unwrap()),
            trend_months: 3,
            ..Default::default()
        };
        let store = RecordStore::default();
        let series = trend_series(&store, &anchor(), &policy, &TargetBook::new(&[]));
        let labels: Vec<&str> = series.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(labels, vec!["May", "Jun", "Jul"]);
    }

    #[test]
    fn test_single_deal_lands_in_one_month() {
        let store = RecordStore {
            deals: vec![won("D1", 100.0, "2025-12-15T09:00:00Z")],
            ..Default::default()
        };

        let targets = TargetBook::new(&store.targets);
        let series = trend_series(&store, &anchor(), &MetricsPolicy::default(), &targets);
        assert_eq!(series.len(), 6);
        assert_eq!(series.iter().filter(|p| p.revenue == 100).count(), 1);
        assert_eq!(series.iter().filter(|p| p.revenue == 0).count(), 5);
        assert_eq!(series[2].month, "Dec");
        assert_eq!(series[2].revenue, 100);
    }

    #[test]
    fn test_targets_resolved_per_month() {
        let store = RecordStore {
            targets: vec![
                Target {
                    month: "2025-10".to_string(),
                    target: 5000.0,
                },
                Target {
                    month: "2025-01".to_string(),
                    target: 1000.0,
                },
                Target {
                    month: "2025-02".to_string(),
                    target: 1234.0,
                },
            ],
            ..Default::default()
        };

        let book = TargetBook::new(&store.targets);
        let series = trend_series(&store, &anchor(), &MetricsPolicy::default(), &book);
        let targets: Vec<i64> = series.iter().map(|p| p.target).collect();
        assert_eq!(targets, vec![5000, 0, 0, 1100, 1357, 0]);
    }

    #[test]
    fn test_month_edges() {
        let store = RecordStore {
            deals: vec![
                won("D1", 10.0, "2025-10-31T23:59:59Z"),
                won("D2", 20.0, "2025-11-01T00:00:00Z"),
            ],
            ..Default::default()
        };

        let targets = TargetBook::new(&[]);
        let series = trend_series(&store, &anchor(), &MetricsPolicy::default(), &targets);
        assert_eq!(series[0].revenue, 10);
        assert_eq!(series[1].revenue, 20);
    }
}
