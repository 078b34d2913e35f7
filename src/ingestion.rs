use crate::error::{Result, SalesMetricsError};
use crate::schema::RecordStore;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub const ACCOUNTS_FILE: &str = "accounts.json";
pub const REPS_FILE: &str = "reps.json";
pub const DEALS_FILE: &str = "deals.json";
pub const ACTIVITIES_FILE: &str = "activities.json";
pub const TARGETS_FILE: &str = "targets.json";

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Fail with `MissingRecordFile` instead of loading an empty collection.
    pub require_all: bool,
}

/// Loads the five record collections from JSON arrays in `dir`.
pub fn load_record_store(dir: impl AsRef<Path>) -> Result<RecordStore> {
    load_record_store_with(dir, &LoadOptions::default())
}

pub fn load_record_store_with(
    dir: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<RecordStore> {
    let dir = dir.as_ref();
    info!("Loading record store from {}", dir.display());

    let store = RecordStore {
        accounts: load_collection(dir, ACCOUNTS_FILE, options)?,
        reps: load_collection(dir, REPS_FILE, options)?,
        deals: load_collection(dir, DEALS_FILE, options)?,
        activities: load_collection(dir, ACTIVITIES_FILE, options)?,
        targets: load_collection(dir, TARGETS_FILE, options)?,
    };

    info!(
        "Loaded {} accounts, {} reps, {} deals, {} activities, {} targets",
        store.accounts.len(),
        store.reps.len(),
        store.deals.len(),
        store.activities.len(),
        store.targets.len()
    );

    Ok(store)
}

fn load_collection<T: DeserializeOwned>(
    dir: &Path,
    file: &str,
    options: &LoadOptions,
) -> Result<Vec<T>> {
    let path = dir.join(file);
    if !path.exists() {
        if options.require_all {
            return Err(SalesMetricsError::MissingRecordFile(path.display().to_string()));
        }
        warn!("Record file not found, using an empty collection: {}", path.display());
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(&path)?;
    let records: Vec<T> = serde_json::from_str(&raw)?;
    debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

impl RecordStore {
    /// Builds a store from JSON array text per collection; `None` means empty.
    pub fn from_json_parts(
        accounts: Option<&str>,
        reps: Option<&str>,
        deals: Option<&str>,
        activities: Option<&str>,
        targets: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            accounts: parse_part(accounts)?,
            reps: parse_part(reps)?,
            deals: parse_part(deals)?,
            activities: parse_part(activities)?,
            targets: parse_part(targets)?,
        })
    }
}

fn parse_part<T: DeserializeOwned>(json: Option<&str>) -> Result<Vec<T>> {
    match json {
        Some(text) => Ok(serde_json::from_str(text)?),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MetricsEngine;
    use crate::schema::{DealStage, RecordIssue};
    use crate::utils::parse_timestamp;
    use tempfile::TempDir;

    const DEALS: &str = r#"[
        {"deal_id": "D1", "amount": 1200, "stage": "Closed Won", "rep_id": "R01",
         "created_at": "2025-11-01T00:00:00.000Z", "closed_at": "2026-01-12T00:00:00.000Z"},
        {"deal_id": "D2", "amount": 800, "stage": "Negotiation", "rep_id": "R02",
         "created_at": "2025-10-01T00:00:00.000Z", "closed_at": null}
    ]"#;

    #[test]
    fn test_load_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEALS_FILE), DEALS).unwrap();
        fs::write(
            dir.path().join(REPS_FILE),
            r#"[{"rep_id": "R01", "name": "Avery Lane"}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(TARGETS_FILE),
            r#"[{"month": "2025-01", "target": 150000}]"#,
        )
        .unwrap();

        let store = load_record_store(dir.path()).unwrap();
        assert_eq!(store.deals.len(), 2);
        assert_eq!(store.deals[0].stage, DealStage::ClosedWon);
        assert_eq!(store.reps.len(), 1);
        assert_eq!(store.targets[0].target, 150000.0);
        assert!(store.accounts.is_empty());
        assert!(store.activities.is_empty());
    }

    #[test]
    fn test_require_all_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEALS_FILE), DEALS).unwrap();

        let options = LoadOptions { require_all: true };
        let result = load_record_store_with(dir.path(), &options);
        assert!(matches!(result, Err(SalesMetricsError::MissingRecordFile(_))));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEALS_FILE), "[{\"deal_id\": ").unwrap();

        let result = load_record_store(dir.path());
        assert!(matches!(result, Err(SalesMetricsError::SerializationError(_))));
    }

    #[test]
    fn test_from_json_parts() {
        let store = RecordStore::from_json_parts(None, None, Some(DEALS), None, None).unwrap();
        assert_eq!(store.deals.len(), 2);
        assert!(store.reps.is_empty());
    }

    #[test]
    fn test_null_amount_loads_and_counts_as_zero() {
        let deals = r#"[
            {"deal_id": "D1", "amount": null, "stage": "Closed Won", "rep_id": "R01",
             "created_at": "2025-12-01", "closed_at": "2026-01-15"},
            {"deal_id": "D2", "amount": 500, "stage": "Closed Won", "rep_id": "R01",
             "created_at": "2025-12-01", "closed_at": "2026-01-20"},
            {"deal_id": "D3", "amount": null, "stage": "Negotiation", "rep_id": "R01",
             "created_at": "2026-01-10", "closed_at": null},
            {"deal_id": "D4", "amount": 700, "stage": "Proposal", "rep_id": "R01",
             "created_at": "2026-01-10", "closed_at": null}
        ]"#;
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEALS_FILE), deals).unwrap();

        let store = load_record_store(dir.path()).unwrap();
        assert_eq!(store.deals.len(), 4);

        let anchor = parse_timestamp("2026-02-05").unwrap();
        let engine = MetricsEngine::new(&store, anchor);
        assert_eq!(engine.summary().revenue, 500.0);
        assert_eq!(engine.drivers().pipeline_value, 700.0);
        assert_eq!(engine.drivers().avg_deal_size, 250);

        let missing = store
            .validate()
            .into_iter()
            .filter(|issue| matches!(issue, RecordIssue::MissingAmount { .. }))
            .count();
        assert_eq!(missing, 2);
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let deals = r#"[{"deal_id": "D1", "amount": 1, "stage": "Proposal", "rep_id": "R01",
                         "created_at": "yesterday"}]"#;
        assert!(RecordStore::from_json_parts(None, None, Some(deals), None, None).is_err());
    }
}
