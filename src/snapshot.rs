use crate::config::MetricsPolicy;
use crate::engine::{DashboardReport, MetricsEngine};
use crate::error::Result;
use crate::schema::RecordStore;
use chrono::{DateTime, Utc};
use log::info;
use std::sync::{Arc, RwLock};

/// Host-side holder for the current record snapshot.
///
/// Readers clone the inner `Arc` and compute against that; a reload swaps the
/// whole `Arc`, so an in-flight computation never sees a half-loaded store.
#[derive(Debug, Default)]
pub struct SharedRecordStore {
    current: RwLock<Arc<RecordStore>>,
}

impl SharedRecordStore {
    pub fn new(store: RecordStore) -> Self {
        Self {
            current: RwLock::new(Arc::new(store)),
        }
    }

    pub fn snapshot(&self) -> Arc<RecordStore> {
        // the guarded value is only ever replaced whole, so a poisoned lock is still consistent
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&*guard)
    }

    /// Installs a new snapshot and returns the one it replaced.
    pub fn replace(&self, store: RecordStore) -> Arc<RecordStore> {
        let next = Arc::new(store);
        info!(
            "Replacing record snapshot: {} deals, {} targets",
            next.deals.len(),
            next.targets.len()
        );
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, next)
    }

    pub fn report(&self, anchor: DateTime<Utc>, policy: MetricsPolicy) -> Result<DashboardReport> {
        let snapshot = self.snapshot();
        let engine = MetricsEngine::with_policy(&snapshot, anchor, policy)?;
        Ok(engine.report())
    }
}
