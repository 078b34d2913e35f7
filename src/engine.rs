use crate::config::MetricsPolicy;
use crate::drivers::{driver_metrics, DriverMetrics};
use crate::error::Result;
use crate::recommendations::recommendations;
use crate::risk::{risk_factors, RiskFactor};
use crate::schema::RecordStore;
use crate::summary::{revenue_summary, RevenueSummary};
use crate::targets::TargetBook;
use crate::trend::{trend_series, TrendPoint};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Binds a record snapshot, an anchor date and a policy.
///
/// Every metric is recomputed on each call; nothing is cached between calls.
pub struct MetricsEngine<'a> {
    store: &'a RecordStore,
    anchor: DateTime<Utc>,
    policy: MetricsPolicy,
    targets: TargetBook,
}

impl<'a> MetricsEngine<'a> {
    pub fn new(store: &'a RecordStore, anchor: DateTime<Utc>) -> Self {
        let policy = MetricsPolicy::default();
        let targets = TargetBook::with_growth_factor(&store.targets, policy.target_growth_factor);
        Self {
            store,
            anchor,
            policy,
            targets,
        }
    }

    pub fn with_policy(
        store: &'a RecordStore,
        anchor: DateTime<Utc>,
        policy: MetricsPolicy,
    ) -> Result<Self> {
        policy.validate()?;
        let targets = TargetBook::with_growth_factor(&store.targets, policy.target_growth_factor);
        Ok(Self {
            store,
            anchor,
            policy,
            targets,
        })
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn policy(&self) -> &MetricsPolicy {
        &self.policy
    }

    pub fn targets(&self) -> &TargetBook {
        &self.targets
    }

    pub fn summary(&self) -> RevenueSummary {
        revenue_summary(self.store, &self.anchor, &self.targets)
    }

    pub fn drivers(&self) -> DriverMetrics {
        driver_metrics(self.store, &self.anchor)
    }

    pub fn risks(&self) -> Vec<RiskFactor> {
        risk_factors(self.store, &self.anchor, &self.policy)
    }

    pub fn recommendations(&self) -> Vec<String> {
        let risks = self.risks();
        recommendations(self.policy.recommendations, &risks)
    }

    pub fn trend(&self) -> Vec<TrendPoint> {
        trend_series(self.store, &self.anchor, &self.policy, &self.targets)
    }

    pub fn report(&self) -> DashboardReport {
        info!(
            "Computing dashboard for anchor {} over {} deals",
            self.anchor.date_naive(),
            self.store.deals.len()
        );

        let issues = self.store.validate();
        if !issues.is_empty() {
            warn!("Record snapshot has {} contract violations", issues.len());
            for issue in &issues {
                debug!("Record issue: {:?}", issue);
            }
        }

        let risks = self.risks();
        let recommendations = recommendations(self.policy.recommendations, &risks);

        DashboardReport {
            anchor: self.anchor,
            summary: self.summary(),
            drivers: self.drivers(),
            risks,
            recommendations,
            trend: self.trend(),
        }
    }
}

/// Every dashboard panel computed from one snapshot and anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardReport {
    pub anchor: DateTime<Utc>,
    pub summary: RevenueSummary,
    pub drivers: DriverMetrics,
    pub risks: Vec<RiskFactor>,
    pub recommendations: Vec<String>,
    pub trend: Vec<TrendPoint>,
}

impl DashboardReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DashboardReport)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}
