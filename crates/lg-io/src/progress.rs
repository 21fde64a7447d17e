//! # Progress Reporter
//!
//! Overwrites a single status line on the diagnostic stream while the
//! header block of a main scan is being read, then blanks it once the
//! body starts.

use std::time::Instant;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use lg_core::progress::{Progress, CLEAR_LINE};

pub struct ProgressReporter {
    started: Instant,
    last: Option<Progress>,
}

impl ProgressReporter {
    /// Start the throughput clock.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            last: None,
        }
    }

    /// Render `progress` over the previous status line.
    pub async fn report<D>(&mut self, diag: &mut D, progress: Progress) -> std::io::Result<()>
    where
        D: AsyncWrite + Unpin,
    {
        let line = progress.render(self.started.elapsed());
        diag.write_all(line.as_bytes()).await?;
        diag.flush().await?;
        self.last = Some(progress);
        Ok(())
    }

    /// Blank the status line. Consumes the reporter: snapshots do not
    /// outlive the header phase.
    pub async fn finish<D>(self, diag: &mut D) -> std::io::Result<Option<Progress>>
    where
        D: AsyncWrite + Unpin,
    {
        diag.write_all(CLEAR_LINE.as_bytes()).await?;
        diag.flush().await?;
        Ok(self.last)
    }
}
