use crate::error::{Result, SalesMetricsError};
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Canonical English month abbreviations, indexed by `month - 1`.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A calendar month identified by its `YYYY-MM` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    first_day: NaiveDate,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first_day| Self { first_day })
            .ok_or_else(|| SalesMetricsError::InvalidMonthKey(format!("{:04}-{:02}", year, month)))
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first_day: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn next(&self) -> Option<Self> {
        self.first_day
            .checked_add_months(Months::new(1))
            .map(|first_day| Self { first_day })
    }

    /// Same month, one year earlier.
    pub fn previous_year(&self) -> Option<Self> {
        self.first_day
            .checked_sub_months(Months::new(12))
            .map(|first_day| Self { first_day })
    }

    pub fn label(&self) -> &'static str {
        month_label(self.month())
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        date_in_range(timestamp, self.first_day, self.last_day())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for MonthKey {
    type Err = SalesMetricsError;

    fn from_str(key: &str) -> Result<Self> {
        let trimmed = key.trim();
        let well_shaped = trimmed.len() == 7
            && trimmed.as_bytes()[4] == b'-'
            && trimmed
                .bytes()
                .enumerate()
                .all(|(idx, b)| idx == 4 || b.is_ascii_digit());
        if !well_shaped {
            return Err(SalesMetricsError::InvalidMonthKey(key.to_string()));
        }

        let first_day = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
            .map_err(|_| SalesMetricsError::InvalidMonthKey(key.to_string()))?;
        Ok(Self { first_day })
    }
}

impl TryFrom<String> for MonthKey {
    type Error = SalesMetricsError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

impl JsonSchema for MonthKey {
    fn schema_name() -> String {
        "MonthKey".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        let mut schema = String::json_schema(gen).into_object();
        schema.string().pattern = Some(r"^\d{4}-\d{2}$".to_string());
        schema.metadata().description = Some("Calendar month in YYYY-MM format".to_string());
        schema.into()
    }
}

/// A calendar quarter (Jan-Mar, Apr-Jun, Jul-Sep, Oct-Dec), both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuarterWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl QuarterWindow {
    pub fn containing(date: NaiveDate) -> Self {
        let start = fiscal_quarter_start(date);
        Self {
            start,
            end: fiscal_quarter_end(start),
        }
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        date_in_range(timestamp, self.start, self.end)
    }

    /// The three months of the quarter in order.
    pub fn months(&self) -> Vec<MonthKey> {
        let first = MonthKey::containing(self.start);
        std::iter::successors(Some(first), |m| m.next())
            .take(3)
            .collect()
    }
}

pub fn fiscal_quarter_start(date: NaiveDate) -> NaiveDate {
    let quarter_month = date.month0() / 3 * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), quarter_month, 1).unwrap_or(date)
}

/// Last day of the three-month block that begins at `quarter_start`.
pub fn fiscal_quarter_end(quarter_start: NaiveDate) -> NaiveDate {
    MonthKey::containing(quarter_start)
        .first_day()
        .checked_add_months(Months::new(3))
        .and_then(|after| after.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Whole days from `from` to `to`, floored. Negative when `to` precedes `from`.
pub fn days_between(from: &DateTime<Utc>, to: &DateTime<Utc>) -> i64 {
    (*to - *from).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

/// The anchor moved back twelve calendar months.
///
/// Uses chrono month arithmetic, so a Feb 29 anchor lands on Feb 28 of the
/// previous year rather than rolling forward into March.
pub fn last_twelve_months_start(anchor: &DateTime<Utc>) -> DateTime<Utc> {
    anchor
        .checked_sub_months(Months::new(12))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Midnight UTC on `date`.
pub fn anchor_from_date(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// True when the UTC calendar date of `timestamp` lies within `[start, end]`.
pub fn date_in_range(timestamp: &DateTime<Utc>, start: NaiveDate, end: NaiveDate) -> bool {
    let date = timestamp.date_naive();
    date >= start && date <= end
}

pub fn month_label(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_ABBREVIATIONS.get(idx as usize))
        .copied()
        .unwrap_or("")
}

/// Rounds to the nearest integer with halves going toward positive infinity.
/// Non-finite input rounds to zero.
pub fn round_half_up(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor as i64 + 1
    } else {
        floor as i64
    }
}

/// Parses a CRM timestamp: RFC 3339, a naive date-time (read as UTC), or a bare date.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(anchor_from_date)
        .map_err(|_| {
            SalesMetricsError::DateError(format!(
                "Invalid timestamp '{}'. Expected RFC 3339, YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD",
                raw
            ))
        })
}

/// Serde adapters accepting every format [`parse_timestamp`] understands.
pub mod flexible_timestamp {
    use super::parse_timestamp;
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::parse_timestamp;
        use chrono::{DateTime, SecondsFormat, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => {
                    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
                }
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(value) => parse_timestamp(value).map(Some).map_err(serde::de::Error::custom),
            }
        }
    }
}
