use crate::config::PRIOR_YEAR_GROWTH_FACTOR;
use crate::schema::Target;
use crate::utils::{MonthKey, QuarterWindow};
use log::warn;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum TargetSource {
    /// A target record exists for the month itself.
    Exact,
    /// Last year's quota for the same month, scaled by the growth factor.
    PriorYearProjection,
    /// Neither year has a record.
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedTarget {
    pub month: MonthKey,
    pub amount: f64,
    pub source: TargetSource,
}

/// Monthly quotas indexed by month.
///
/// Duplicate months keep the first record; records with an unparseable month
/// are dropped.
#[derive(Debug, Clone)]
pub struct TargetBook {
    quotas: HashMap<MonthKey, f64>,
    growth_factor: f64,
}

impl TargetBook {
    pub fn new(targets: &[Target]) -> Self {
        Self::with_growth_factor(targets, PRIOR_YEAR_GROWTH_FACTOR)
    }

    pub fn with_growth_factor(targets: &[Target], growth_factor: f64) -> Self {
        let mut quotas = HashMap::with_capacity(targets.len());
        for target in targets {
            match target.month.parse::<MonthKey>() {
                Ok(key) => {
                    quotas.entry(key).or_insert(target.target);
                }
                Err(_) => warn!("Ignoring target with invalid month key '{}'", target.month),
            }
        }

        Self {
            quotas,
            growth_factor,
        }
    }

    pub fn resolve_detailed(&self, month: MonthKey) -> ResolvedTarget {
        if let Some(amount) = self.quotas.get(&month) {
            return ResolvedTarget {
                month,
                amount: *amount,
                source: TargetSource::Exact,
            };
        }

        let prior = month
            .previous_year()
            .and_then(|prior| self.quotas.get(&prior));

        match prior {
            Some(amount) => ResolvedTarget {
                month,
                amount: amount * self.growth_factor,
                source: TargetSource::PriorYearProjection,
            },
            None => ResolvedTarget {
                month,
                amount: 0.0,
                source: TargetSource::Missing,
            },
        }
    }

    /// Quota for one month: exact record, else prior year times the growth factor, else 0.
    pub fn resolve(&self, month: MonthKey) -> f64 {
        self.resolve_detailed(month).amount
    }

    /// Sum of per-month resolutions, so partially covered ranges still yield an estimate.
    pub fn resolve_range<I>(&self, months: I) -> f64
    where
        I: IntoIterator<Item = MonthKey>,
    {
        months.into_iter().map(|m| self.resolve(m)).sum()
    }

    pub fn resolve_quarter(&self, quarter: &QuarterWindow) -> f64 {
        self.resolve_range(quarter.months())
    }
}

/// Resolves a single month without building a [`TargetBook`] first.
pub fn resolve_monthly_target(targets: &[Target], month: MonthKey) -> f64 {
    TargetBook::new(targets).resolve(month)
}
