//! # Scan Driver & Context Expander
//!
//! One [`Scanner::run`] is one main scan: connect, send the query, feed
//! progress headers to the reporter, then stream body rows to the output.
//!
//! When context is requested, each matched row is bracketed inline:
//!
//! ```text
//! <before window>   (bounded query, own connection)
//! <match>
//! <after window>    (bounded query, own connection)
//! ---
//! ```
//!
//! All of it completes before the next main-scan line is read, so the
//! output order is exactly the server order plus adjacent windows.

use std::time::Instant;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use lg_core::query::{self, ContextSide};
use lg_core::row::{format_line, RowKey};
use lg_core::ScanConfig;

use crate::connection::Connector;
use crate::error::ScanError;
use crate::progress::ProgressReporter;
use crate::reader::{Header, Request, StreamReader};

/// Printed after each match when context windows are enabled.
pub const SEPARATOR: &[u8] = b"---\n";

/// Outcome of one main scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Parsed rows emitted by the main scan (context rows excluded).
    pub rows: u64,
    /// Key of the last main-scan row emitted.
    pub last: Option<RowKey>,
}

pub struct Scanner<'a, C> {
    connector: &'a C,
    config: &'a ScanConfig,
    cancel: CancellationToken,
}

impl<'a, C: Connector> Scanner<'a, C> {
    pub fn new(connector: &'a C, config: &'a ScanConfig, cancel: CancellationToken) -> Self {
        Self {
            connector,
            config,
            cancel,
        }
    }

    /// Run the main scan, writing rows to `out` and progress to `diag`.
    pub async fn run<O, D>(&self, out: &mut O, diag: &mut D) -> Result<ScanSummary, ScanError>
    where
        O: AsyncWrite + Unpin,
        D: AsyncWrite + Unpin,
    {
        let text = query::scan_query(self.config);
        tracing::debug!(query = %text, "executing scan");

        let stream = self.connector.connect().await?;
        let mut reader = StreamReader::open(stream, &Request::scan(&text), self.cancel.clone()).await?;

        let mut reporter = ProgressReporter::start();
        while let Some(header) = reader.next_header().await? {
            if let Header::Progress(p) = header {
                reporter.report(diag, p).await?;
            }
        }
        reporter.finish(diag).await?;

        let mut summary = ScanSummary::default();
        while let Some(line) = reader.next_line().await? {
            let (rendered, key) = format_line(&line);
            let Some(key) = key else {
                out.write_all(&rendered).await?;
                continue;
            };

            if self.config.before_lines > 0 {
                self.expand(&key, ContextSide::Before, self.config.before_lines, out)
                    .await?;
            }
            out.write_all(&rendered).await?;
            if self.config.after_lines > 0 {
                self.expand(&key, ContextSide::After, self.config.after_lines, out)
                    .await?;
            }
            if self.config.wants_context() {
                out.write_all(SEPARATOR).await?;
            }

            summary.rows += 1;
            summary.last = Some(key);
        }
        out.flush().await?;

        tracing::trace!(rows = summary.rows, "scan complete");
        Ok(summary)
    }

    /// Fetch and emit up to `count` rows adjacent to `key` on `side`, in
    /// output order. Context rows never trigger further expansion.
    async fn expand<O>(
        &self,
        key: &RowKey,
        side: ContextSide,
        count: u64,
        out: &mut O,
    ) -> Result<usize, ScanError>
    where
        O: AsyncWrite + Unpin,
    {
        let started = Instant::now();
        let ctx = query::context_query(self.config, key, side, count);
        tracing::debug!(%side, query = %ctx.text, "context query");

        let stream = self.connector.connect().await?;
        let mut reader =
            StreamReader::open(stream, &Request::context(&ctx.text), self.cancel.clone()).await?;
        reader.skip_headers().await?;
        let mut lines = reader.read_body().await?;
        drop(reader);

        if ctx.reverse_rows {
            lines.reverse();
        }
        tracing::debug!(%side, rows = lines.len(), elapsed = ?started.elapsed(), "context calculated");

        for line in &lines {
            let (rendered, key) = format_line(line);
            out.write_all(&rendered).await?;
            if key.is_none() {
                out.write_all(b"\n").await?;
            }
        }
        Ok(lines.len())
    }
}
