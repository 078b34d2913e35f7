//! # Sales Metrics Engine
//!
//! Deterministic, time-windowed sales performance metrics computed from an
//! immutable snapshot of CRM records (deals, reps, accounts, activities, targets).
//!
//! ## Core Concepts
//!
//! - **Record Store**: an immutable snapshot of the five record collections
//! - **Anchor**: the single "now" every window is measured from; the clock is never read
//! - **Reducers**: pure folds producing the summary, driver, risk and trend panels
//! - **Target Resolution**: monthly quotas with a prior-year projection fallback
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_metrics_engine::*;
//! use chrono::NaiveDate;
//!
//! let store = load_record_store("data")?;
//! let anchor = anchor_from_date(NaiveDate::from_ymd_opt(2026, 2, 5).unwrap());
//!
//! let report = compute_dashboard(&store, anchor)?;
//! println!("{}", report.to_json_pretty()?);
//! ```

pub mod config;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod recommendations;
pub mod risk;
pub mod schema;
pub mod snapshot;
pub mod summary;
pub mod targets;
pub mod trend;
pub mod utils;

pub use config::{MetricsPolicy, RecommendationStrategy, PRIOR_YEAR_GROWTH_FACTOR};
pub use drivers::{driver_metrics, DriverMetrics};
pub use engine::{DashboardReport, MetricsEngine};
pub use error::{Result, SalesMetricsError};
pub use ingestion::{load_record_store, load_record_store_with, LoadOptions};
pub use recommendations::{recommendations, STATIC_RECOMMENDATIONS};
pub use risk::{risk_factors, RiskFactor, RiskKind, Severity};
pub use schema::*;
pub use snapshot::SharedRecordStore;
pub use summary::{revenue_summary, RevenueSummary};
pub use targets::{resolve_monthly_target, ResolvedTarget, TargetBook, TargetSource};
pub use trend::{trend_months, trend_origin, trend_series, TrendPoint};
pub use utils::*;

use chrono::{DateTime, Utc};

/// Computes every dashboard panel with the default policy.
pub fn compute_dashboard(store: &RecordStore, anchor: DateTime<Utc>) -> Result<DashboardReport> {
    compute_dashboard_with_policy(store, anchor, MetricsPolicy::default())
}

pub fn compute_dashboard_with_policy(
    store: &RecordStore,
    anchor: DateTime<Utc>,
    policy: MetricsPolicy,
) -> Result<DashboardReport> {
    let engine = MetricsEngine::with_policy(store, anchor, policy)?;
    Ok(engine.report())
}
