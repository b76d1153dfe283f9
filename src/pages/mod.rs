//! Page flows built on the dispatcher
//!
//! - [`job`]: build and defconfig totals plus the build list of one job
//! - [`boot_job`]: boot reports of one job, with per-kernel PASS/FAIL counts
//! - [`boot`]: detail of a single boot report

pub mod boot;
pub mod boot_job;
pub mod job;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// `{"$date": millis}` as stored by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BackendDate {
    #[serde(rename = "$date")]
    pub millis: i64,
}

impl BackendDate {
    /// The instant, if `millis` is in range
    #[must_use]
    pub fn to_utc(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.millis)
    }
}

/// Pull a count out of a count-endpoint result
///
/// The backend answers `[{"count": n}]`; a bare object or number is also
/// accepted.
#[must_use]
pub fn extract_count(result: &Value) -> Option<u64> {
    match result {
        Value::Array(items) => items.first().and_then(extract_count),
        Value::Object(map) => map.get("count").and_then(Value::as_u64),
        other => other.as_u64(),
    }
}
