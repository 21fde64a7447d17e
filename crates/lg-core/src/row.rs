//! # Event Rows
//!
//! A body line is `time \t millis \t field1 \t field2 ...`. Lines with
//! fewer than three tab-separated fields are not rows (error bodies,
//! banners) and are emitted verbatim by the caller.

use std::cmp::Ordering;

/// Composite ordering key of an event: second-resolution timestamp text
/// plus milliseconds. Ties beyond this key are not broken.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub timestamp: String,
    pub millis: u32,
}

impl Ord for RowKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        (self.timestamp.as_str(), self.millis).cmp(&(other.timestamp.as_str(), other.millis))
    }
}

impl PartialOrd for RowKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A parsed body line, borrowing from the line buffer. Fields stay raw
/// bytes so payloads that are not valid UTF-8 render unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRow<'a> {
    pub timestamp: &'a [u8],
    pub millis: u32,
    /// Remaining fields, still tab-joined, possibly with a trailing newline.
    pub payload: &'a [u8],
}

impl<'a> EventRow<'a> {
    /// Split a body line into its parts. Returns `None` for lines with
    /// fewer than three fields. An unparsable millis field becomes 0.
    pub fn parse(line: &'a [u8]) -> Option<Self> {
        let mut parts = line.splitn(3, |b| *b == b'\t');
        let timestamp = parts.next()?;
        let millis = parts.next()?;
        let payload = parts.next()?;
        Some(Self {
            timestamp,
            millis: std::str::from_utf8(millis)
                .ok()
                .and_then(|m| m.parse().ok())
                .unwrap_or(0),
            payload,
        })
    }

    pub fn key(&self) -> RowKey {
        RowKey {
            timestamp: String::from_utf8_lossy(self.timestamp).into_owned(),
            millis: self.millis,
        }
    }

    /// Display line: `<timestamp>.<mmm>\t<payload>\n`, with the payload's
    /// internal tabs turned into spaces and trailing whitespace dropped.
    pub fn render(&self) -> Vec<u8> {
        let payload = self.payload.trim_ascii_end();
        let mut out = Vec::with_capacity(self.timestamp.len() + payload.len() + 6);
        out.extend_from_slice(self.timestamp);
        out.extend_from_slice(format!(".{:03}\t", self.millis).as_bytes());
        out.extend(payload.iter().map(|&b| if b == b'\t' { b' ' } else { b }));
        out.push(b'\n');
        out
    }
}

/// Format one raw body line for output: parsed rows are rendered,
/// anything else is returned byte-for-byte.
pub fn format_line(line: &[u8]) -> (Vec<u8>, Option<RowKey>) {
    match EventRow::parse(line) {
        Some(row) => (row.render(), Some(row.key())),
        None => (line.to_vec(), None),
    }
}
