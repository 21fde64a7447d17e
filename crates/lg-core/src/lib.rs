//! # lg-core — The "Grammar" of loggrep
//!
//! Everything that turns search intent into query text and raw response
//! lines into display lines. Nothing in this crate touches a socket.
//!
//! - [`escape`]: literal escaping for single-quoted query strings.
//! - [`query`]: predicate building, main scan and context query assembly.
//! - [`row`]: event row parsing and the display formatter.
//! - [`progress`]: progress notification decoding and rendering.
//! - [`cursor`]: the forward-only tail cursor.

pub mod config;
pub mod cursor;
pub mod escape;
pub mod progress;
pub mod query;
pub mod row;

pub use config::ScanConfig;
pub use row::{EventRow, RowKey};
