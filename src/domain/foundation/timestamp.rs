//! Timestamp value object for immutable points in time.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp from whole seconds since the Unix epoch.
    pub fn from_unix_seconds(secs: i64) -> Result<Self, ValidationError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| ValidationError::invalid_format("timestamp", "out of range"))
    }

    /// RFC 3339 rendering with a `Z` suffix and second precision.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Renders an optional Unix timestamp as stored in billing records.
///
/// Absent values render as the epoch, same as zero.
pub fn iso8601_from_unix(secs: Option<i64>) -> Result<String, ValidationError> {
    Timestamp::from_unix_seconds(secs.unwrap_or(0)).map(|t| t.to_rfc3339())
}
