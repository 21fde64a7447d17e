//! # Progress Notifications
//!
//! While a query runs, the service streams header lines of the form
//!
//! ```text
//! X-ClickHouse-Progress: {"read_rows":"50","read_bytes":"1000",...}
//! ```
//!
//! before the body starts. Counters arrive as JSON strings.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Header prefix marking a progress notification.
pub const PROGRESS_PREFIX: &str = "X-ClickHouse-Progress: ";

/// Clear the current terminal line and return the carriage.
pub const CLEAR_LINE: &str = "\x1b[2K\r";

const GIB: f64 = (1u64 << 30) as f64;

/// One progress snapshot. Extra fields sent by newer servers are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Progress {
    #[serde(deserialize_with = "string_u64")]
    pub read_rows: u64,
    #[serde(deserialize_with = "string_u64")]
    pub read_bytes: u64,
    #[serde(deserialize_with = "string_u64")]
    pub written_rows: u64,
    #[serde(deserialize_with = "string_u64")]
    pub written_bytes: u64,
    #[serde(deserialize_with = "string_u64")]
    pub total_rows_to_read: u64,
}

fn string_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl Progress {
    /// Decode the JSON payload that follows [`PROGRESS_PREFIX`].
    pub fn decode(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// If `header` is a progress notification, return its payload.
    pub fn payload_of(header: &str) -> Option<&str> {
        header.strip_prefix(PROGRESS_PREFIX)
    }

    /// Rows read as a percentage of the expected total. Not guarded:
    /// a zero total yields NaN or infinity.
    pub fn percent(&self) -> f64 {
        self.read_rows as f64 / self.total_rows_to_read as f64 * 100.0
    }

    /// Bytes read per second over `elapsed`, in GiB.
    pub fn gib_per_sec(&self, elapsed: Duration) -> f64 {
        self.read_bytes as f64 / elapsed.as_secs_f64() / GIB
    }

    /// Status line, prefixed with [`CLEAR_LINE`] so it overwrites in place.
    pub fn render(&self, elapsed: Duration) -> String {
        format!(
            "{CLEAR_LINE}Progress: {:.0}% (read {:.2} GiB so far, {:.2} GiB/sec)",
            self.percent(),
            self.read_bytes as f64 / GIB,
            self.gib_per_sec(elapsed),
        )
    }
}
