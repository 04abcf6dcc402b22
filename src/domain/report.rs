use super::money::Money;
use super::profile::ProfileId;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive payment-date window used by the admin reports.
///
/// Bounds are held at millisecond precision, the resolution payment dates are stored at:
/// `start` rounds up and `end` rounds down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(PaymentError::ValidationError(
                "start must not be after end".to_string(),
            ));
        }
        Ok(Self {
            start: ceil_millis(start),
            end: floor_millis(end),
        })
    }

    /// Parses query-string bounds given as `YYYY-MM-DD` or RFC 3339.
    ///
    /// A date-only `end` covers the whole day.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let start = start.ok_or_else(|| {
            PaymentError::ValidationError("Missing start query parameter".to_string())
        })?;
        let end = end.ok_or_else(|| {
            PaymentError::ValidationError("Missing end query parameter".to_string())
        })?;
        Self::new(parse_bound(start, false)?, parse_bound(end, true)?)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

fn sub_millis(at: DateTime<Utc>) -> TimeDelta {
    TimeDelta::nanoseconds(i64::from(at.timestamp_subsec_nanos() % 1_000_000))
}

fn floor_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    at - sub_millis(at)
}

fn ceil_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    let rest = sub_millis(at);
    if rest.is_zero() {
        at
    } else {
        at - rest + TimeDelta::milliseconds(1)
    }
}

fn parse_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| PaymentError::ValidationError(format!("Invalid date: {raw}")))?;
    let time = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| PaymentError::ValidationError(format!("Invalid date: {raw}")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionEarnings {
    pub profession: String,
    pub total_earned: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSpending {
    pub id: ProfileId,
    pub full_name: String,
    pub paid: Money,
}
