//! # Tail Cursor
//!
//! The lower time bound of the next tail cycle. Starts at a lookback
//! literal (epoch seconds) or a user-supplied bound, then follows the
//! timestamp of the last emitted row.
//!
//! # Invariant
//!
//! Once the cursor holds a parsed timestamp it never moves backwards.
//! The bound is exclusive and second-resolution, so rows sharing the
//! cursor's second but arriving later are skipped by the next cycle.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Row timestamp layout of the `time` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How far back the first tail cycle looks when no bound was given.
pub const DEFAULT_LOOKBACK_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Opaque bound passed through to `toDateTime(...)` as-is.
    Literal(String),
    /// Timestamp of the last row seen.
    At(NaiveDateTime),
}

impl Cursor {
    /// Cursor `DEFAULT_LOOKBACK_SECS` before `now`, as epoch seconds.
    pub fn lookback(now: DateTime<Utc>) -> Self {
        let start = now - Duration::seconds(DEFAULT_LOOKBACK_SECS);
        Self::Literal(start.timestamp().to_string())
    }

    /// Cursor from a user-supplied bound. Recognised timestamps become
    /// ordered positions, anything else is kept verbatim.
    pub fn from_bound(bound: &str) -> Self {
        match parse_timestamp(bound) {
            Some(at) => Self::At(at),
            None => Self::Literal(bound.to_string()),
        }
    }

    /// Text spliced into the lower-bound predicate.
    pub fn bound(&self) -> String {
        match self {
            Self::Literal(raw) => raw.clone(),
            Self::At(at) => at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Move to the timestamp of the last emitted row. Returns whether
    /// the cursor changed. Unparsable or older timestamps are ignored.
    pub fn advance(&mut self, last_timestamp: &str) -> bool {
        let Some(next) = parse_timestamp(last_timestamp) else {
            return false;
        };
        match self {
            Self::At(current) if next <= *current => false,
            _ => {
                *self = Self::At(next);
                true
            }
        }
    }
}

/// Parse a row timestamp, dropping any sub-second part.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    let seconds = raw.split('.').next()?;
    NaiveDateTime::parse_from_str(seconds, TIMESTAMP_FORMAT).ok()
}
