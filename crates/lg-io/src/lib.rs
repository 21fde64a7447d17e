//! # lg-io — The "Engine" of loggrep
//!
//! Drives scans against the query service: one fresh connection per
//! query, header block with progress notifications, then a TSV body
//! streamed row by row. Context windows are fetched inline, strictly
//! between main-scan rows, and the tail loop repeats the whole scan
//! behind a forward-only cursor.

pub mod connection;
pub mod error;
pub mod progress;
pub mod reader;
pub mod scan;
pub mod tail;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::{Connector, TcpConnector};
pub use error::ScanError;
pub use scan::{ScanSummary, Scanner};
pub use tail::TailController;
