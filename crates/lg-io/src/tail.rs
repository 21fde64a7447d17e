//! # Tail Controller
//!
//! Repeats the main scan forever in oldest-first order, each cycle
//! starting after the timestamp of the last row the previous cycle
//! emitted. Between cycles it sleeps for a fixed interval.
//!
//! ```text
//! idle ──first cycle──▶ polling ──cycle, advance, sleep──▶ polling ...
//! ```
//!
//! There is no terminal state: the loop ends only on an error, a broken
//! output pipe, or cancellation.

use std::time::Duration;

use chrono::Utc;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

use lg_core::cursor::Cursor;
use lg_core::ScanConfig;

use crate::connection::Connector;
use crate::error::ScanError;
use crate::scan::{ScanSummary, Scanner};

/// Pause between tail cycles.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct TailController<'a, C> {
    connector: &'a C,
    base: ScanConfig,
    cursor: Cursor,
    interval: Duration,
    cancel: CancellationToken,
}

impl<'a, C: Connector> TailController<'a, C> {
    /// Forces forward ordering. Without an explicit lower bound the
    /// first cycle looks back one minute from now.
    pub fn new(connector: &'a C, config: &ScanConfig, cancel: CancellationToken) -> Self {
        let cursor = match &config.after {
            Some(bound) => Cursor::from_bound(bound),
            None => Cursor::lookback(Utc::now()),
        };
        Self {
            connector,
            base: config.forward(),
            cursor,
            interval: POLL_INTERVAL,
            cancel,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Configuration the next cycle will scan with.
    pub fn cycle_config(&self) -> ScanConfig {
        self.base.with_lower_bound(self.cursor.bound())
    }

    /// Run one scan from the current cursor, then advance the cursor to
    /// the last emitted row (if any).
    pub async fn cycle<O, D>(&mut self, out: &mut O, diag: &mut D) -> Result<ScanSummary, ScanError>
    where
        O: AsyncWrite + Unpin,
        D: AsyncWrite + Unpin,
    {
        let config = self.cycle_config();
        let summary = Scanner::new(self.connector, &config, self.cancel.clone())
            .run(out, diag)
            .await?;

        if let Some(last) = &summary.last {
            if self.cursor.advance(&last.timestamp) {
                tracing::debug!(cursor = %self.cursor.bound(), "tail cursor advanced");
            }
        }
        Ok(summary)
    }

    /// Cycle until an error or cancellation. Never returns `Ok`.
    pub async fn run<O, D>(mut self, out: &mut O, diag: &mut D) -> Result<(), ScanError>
    where
        O: AsyncWrite + Unpin,
        D: AsyncWrite + Unpin,
    {
        loop {
            let summary = self.cycle(out, diag).await?;
            tracing::trace!(rows = summary.rows, "tail cycle done");

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ScanError::Cancelled),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
