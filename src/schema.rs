use crate::utils::{flexible_timestamp, MonthKey};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
pub enum DealStage {
    #[schemars(description = "Early qualification of interest")]
    Prospecting,

    Qualification,

    Proposal,

    Negotiation,

    #[serde(rename = "Closed Won")]
    #[schemars(description = "Terminal: the deal was won. Requires closed_at.")]
    ClosedWon,

    #[serde(rename = "Closed Lost")]
    #[schemars(description = "Terminal: the deal was lost. Requires closed_at.")]
    ClosedLost,

    /// Any stage name the engine does not recognise. Always treated as open.
    #[serde(other)]
    Open,
}

impl DealStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DealStage::ClosedWon | DealStage::ClosedLost)
    }

    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Deal {
    pub deal_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        description = "Deal value in the reporting currency. Expected to be non-negative; missing or null counts as 0."
    )]
    pub amount: Option<f64>,

    pub stage: DealStage,

    pub rep_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(with = "flexible_timestamp")]
    #[schemars(with = "String")]
    pub created_at: DateTime<Utc>,

    #[serde(default, with = "flexible_timestamp::option")]
    #[schemars(
        with = "Option<String>",
        description = "Set if and only if the stage is Closed Won or Closed Lost"
    )]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Deal {
    /// Deal value, with a missing amount counted as zero.
    pub fn value(&self) -> f64 {
        self.amount.unwrap_or(0.0)
    }

    /// Close timestamp of a well-formed terminal deal.
    ///
    /// A terminal deal missing `closed_at` and an open deal carrying one both
    /// return `None`, so every closed-deal metric skips them.
    pub fn closed_on(&self) -> Option<&DateTime<Utc>> {
        if self.stage.is_terminal() {
            self.closed_at.as_ref()
        } else {
            None
        }
    }

    pub fn is_won(&self) -> bool {
        self.stage == DealStage::ClosedWon && self.closed_at.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.stage.is_open()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Rep {
    pub rep_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Target {
    #[schemars(description = "Calendar month in YYYY-MM format")]
    pub month: String,

    #[schemars(description = "Revenue quota for the month")]
    pub target: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Account {
    pub account_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Activity {
    pub activity_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_id: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Immutable snapshot of every CRM collection the engine reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RecordStore {
    #[serde(default)]
    pub accounts: Vec<Account>,

    #[serde(default)]
    pub reps: Vec<Rep>,

    #[serde(default)]
    pub deals: Vec<Deal>,

    #[serde(default)]
    pub activities: Vec<Activity>,

    #[serde(default)]
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum RecordIssue {
    ClosedWithoutTimestamp { deal_id: String },
    OpenWithCloseTimestamp { deal_id: String },
    ClosedBeforeCreated { deal_id: String },
    MissingAmount { deal_id: String },
    NegativeAmount { deal_id: String },
    UnknownRep { deal_id: String, rep_id: String },
    InvalidTargetMonth { month: String },
    DuplicateTargetMonth { month: String },
}

impl RecordStore {
    pub fn new(
        accounts: Vec<Account>,
        reps: Vec<Rep>,
        deals: Vec<Deal>,
        activities: Vec<Activity>,
        targets: Vec<Target>,
    ) -> Self {
        Self {
            accounts,
            reps,
            deals,
            activities,
            targets,
        }
    }

    /// Display name for a rep, falling back to the raw id.
    pub fn rep_display_name<'a>(&'a self, rep_id: &'a str) -> &'a str {
        self.reps
            .iter()
            .find(|r| r.rep_id == rep_id)
            .map(|r| r.name.as_str())
            .unwrap_or(rep_id)
    }

    /// Reports input-contract violations. Reducers tolerate all of these.
    pub fn validate(&self) -> Vec<RecordIssue> {
        let mut issues = Vec::new();
        let known_reps: HashSet<&str> = self.reps.iter().map(|r| r.rep_id.as_str()).collect();

        for deal in &self.deals {
            match (deal.stage.is_terminal(), &deal.closed_at) {
                (true, None) => issues.push(RecordIssue::ClosedWithoutTimestamp {
                    deal_id: deal.deal_id.clone(),
                }),
                (false, Some(_)) => issues.push(RecordIssue::OpenWithCloseTimestamp {
                    deal_id: deal.deal_id.clone(),
                }),
                _ => {}
            }

            if let Some(closed) = &deal.closed_at {
                if *closed < deal.created_at {
                    issues.push(RecordIssue::ClosedBeforeCreated {
                        deal_id: deal.deal_id.clone(),
                    });
                }
            }

            match deal.amount {
                None => issues.push(RecordIssue::MissingAmount {
                    deal_id: deal.deal_id.clone(),
                }),
                Some(amount) if amount < 0.0 => issues.push(RecordIssue::NegativeAmount {
                    deal_id: deal.deal_id.clone(),
                }),
                Some(_) => {}
            }

            if !known_reps.contains(deal.rep_id.as_str()) {
                issues.push(RecordIssue::UnknownRep {
                    deal_id: deal.deal_id.clone(),
                    rep_id: deal.rep_id.clone(),
                });
            }
        }

        let mut seen_months = HashSet::new();
        for target in &self.targets {
            match target.month.parse::<MonthKey>() {
                Ok(key) => {
                    if !seen_months.insert(key) {
                        issues.push(RecordIssue::DuplicateTargetMonth {
                            month: target.month.clone(),
                        });
                    }
                }
                Err(_) => issues.push(RecordIssue::InvalidTargetMonth {
                    month: target.month.clone(),
                }),
            }
        }

        issues
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RecordStore)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = RecordStore::schema_as_json().unwrap();
        assert!(schema_json.contains("deals"));
        assert!(schema_json.contains("closed_at"));
        assert!(schema_json.contains("Closed Won"));
    }

    #[test]
    fn test_deal_deserialization() {
        let json = r#"{
            "deal_id": "D001",
            "amount": 25000,
            "stage": "Closed Won",
            "rep_id": "R01",
            "account_id": "A07",
            "created_at": "2025-09-01",
            "closed_at": "2025-11-14T10:30:00Z"
        }"#;

        let deal: Deal = serde_json::from_str(json).unwrap();
        assert_eq!(deal.stage, DealStage::ClosedWon);
        assert!(deal.is_won());
        assert!(deal.closed_on().is_some());
        assert_eq!(deal.account_id.as_deref(), Some("A07"));
    }

    #[test]
    fn test_unknown_stage_is_open() {
        let json = r#"{
            "deal_id": "D002",
            "amount": 100,
            "stage": "Discovery",
            "rep_id": "R01",
            "created_at": "2025-09-01",
            "closed_at": null
        }"#;

        let deal: Deal = serde_json::from_str(json).unwrap();
        assert_eq!(deal.stage, DealStage::Open);
        assert!(deal.is_open());
        assert!(deal.closed_on().is_none());
    }

    #[test]
    fn test_terminal_without_timestamp_is_not_closed() {
        let json = r#"{
            "deal_id": "D003",
            "amount": 100,
            "stage": "Closed Won",
            "rep_id": "R01",
            "created_at": "2025-09-01"
        }"#;

        let deal: Deal = serde_json::from_str(json).unwrap();
        assert!(!deal.is_won());
        assert!(!deal.is_open());
        assert!(deal.closed_on().is_none());
    }

    #[test]
    fn test_rep_display_name_fallback() {
        let store = RecordStore {
            reps: vec![Rep {
                rep_id: "R01".to_string(),
                name: "Dana Whitfield".to_string(),
            }],
            ..Default::default()
        };
        assert_eq!(store.rep_display_name("R01"), "Dana Whitfield");
        assert_eq!(store.rep_display_name("R99"), "R99");
    }

    #[test]
    fn test_validate_reports_contract_violations() {
        let deals_json = r#"[
            {"deal_id": "D1", "amount": 10, "stage": "Closed Won", "rep_id": "R01",
             "created_at": "2025-01-01"},
            {"deal_id": "D2", "amount": 10, "stage": "Proposal", "rep_id": "R01",
             "created_at": "2025-01-01", "closed_at": "2025-02-01"},
            {"deal_id": "D3", "amount": -5, "stage": "Closed Lost", "rep_id": "R02",
             "created_at": "2025-03-01", "closed_at": "2025-02-01"}
        ]"#;
        let store = RecordStore {
            reps: vec![Rep {
                rep_id: "R01".to_string(),
                name: "Dana".to_string(),
            }],
            deals: serde_json::from_str(deals_json).unwrap(),
            targets: vec![
                Target {
                    month: "2025-01".to_string(),
                    target: 1.0,
                },
                Target {
                    month: "2025-01".to_string(),
                    target: 2.0,
                },
                Target {
                    month: "Jan 2025".to_string(),
                    target: 3.0,
                },
            ],
            ..Default::default()
        };

        let issues = store.validate();
        assert!(issues.contains(&RecordIssue::ClosedWithoutTimestamp {
            deal_id: "D1".to_string()
        }));
        assert!(issues.contains(&RecordIssue::OpenWithCloseTimestamp {
            deal_id: "D2".to_string()
        }));
        assert!(issues.contains(&RecordIssue::ClosedBeforeCreated {
            deal_id: "D3".to_string()
        }));
        assert!(issues.contains(&RecordIssue::NegativeAmount {
            deal_id: "D3".to_string()
        }));
        assert!(issues.contains(&RecordIssue::UnknownRep {
            deal_id: "D3".to_string(),
            rep_id: "R02".to_string()
        }));
        assert!(issues.contains(&RecordIssue::DuplicateTargetMonth {
            month: "2025-01".to_string()
        }));
        assert!(issues.contains(&RecordIssue::InvalidTargetMonth {
            month: "Jan 2025".to_string()
        }));
        assert_eq!(issues.len(), 7);
    }

    #[test]
    fn test_null_or_missing_amount_counts_as_zero() {
        let json = r#"[
            {"deal_id": "D1", "amount": null, "stage": "Proposal", "rep_id": "R01",
             "created_at": "2025-09-01"},
            {"deal_id": "D2", "stage": "Proposal", "rep_id": "R01", "created_at": "2025-09-01"},
            {"deal_id": "D3", "amount": 500, "stage": "Proposal", "rep_id": "R01",
             "created_at": "2025-09-01"}
        ]"#;
        let store = RecordStore {
            reps: vec![Rep {
                rep_id: "R01".to_string(),
                name: "Dana".to_string(),
            }],
            deals: serde_json::from_str(json).unwrap(),
            ..Default::default()
        };

        assert_eq!(store.deals[0].amount, None);
        assert_eq!(store.deals[0].value(), 0.0);
        assert_eq!(store.deals[2].value(), 500.0);
        assert_eq!(
            store.validate(),
            vec![
                RecordIssue::MissingAmount {
                    deal_id: "D1".to_string()
                },
                RecordIssue::MissingAmount {
                    deal_id: "D2".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_short_month_key_is_invalid_not_duplicate() {
        let store = RecordStore {
            targets: vec![
                Target {
                    month: "2025-01".to_string(),
                    target: 1.0,
                },
                Target {
                    month: "2025-1".to_string(),
                    target: 2.0,
                },
            ],
            ..Default::default()
        };

        assert_eq!(
            store.validate(),
            vec![RecordIssue::InvalidTargetMonth {
                month: "2025-1".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let store: RecordStore = serde_json::from_str(r#"{"deals": []}"#).unwrap();
        assert!(store.accounts.is_empty());
        assert!(store.activities.is_empty());
        assert!(store.validate().is_empty());
    }
}
