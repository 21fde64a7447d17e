//! # Stream Reader
//!
//! Speaks the service's line protocol over one connection:
//!
//! 1. Write a single `GET /?<params> HTTP/1.0` request.
//! 2. Read header lines until a blank line, surfacing progress headers.
//! 3. Yield body lines until the peer closes the stream.
//!
//! Every line read races against the cancellation token.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use url::form_urlencoded;

use lg_core::progress::Progress;

use crate::error::ScanError;

/// Query parameters of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    params: Vec<(&'static str, String)>,
}

impl Request {
    /// Main scan: progress headers on, server-side cancel on disconnect.
    pub fn scan(query: &str) -> Self {
        Self {
            params: vec![
                ("cancel_http_readonly_queries_on_client_close", "1".to_string()),
                ("send_progress_in_http_headers", "1".to_string()),
                ("query", query.to_string()),
            ],
        }
    }

    /// Context fetch: the query alone.
    pub fn context(query: &str) -> Self {
        Self {
            params: vec![("query", query.to_string())],
        }
    }

    /// The request as written on the wire, blank line included.
    pub fn line(&self) -> String {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter().map(|(k, v)| (*k, v.as_str())))
            .finish();
        format!("GET /?{encoded} HTTP/1.0\n\n")
    }
}

/// A header line classified by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Progress(Progress),
    Other(String),
}

pub struct StreamReader<S> {
    inner: BufReader<S>,
    cancel: CancellationToken,
}

impl<S> StreamReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Send `request` on `stream` and return a reader positioned at the
    /// start of the response headers.
    pub async fn open(
        mut stream: S,
        request: &Request,
        cancel: CancellationToken,
    ) -> Result<Self, ScanError> {
        stream.write_all(request.line().as_bytes()).await?;
        stream.flush().await?;
        Ok(Self {
            inner: BufReader::new(stream),
            cancel,
        })
    }

    /// One raw line including its terminator, or `None` at stream end.
    async fn read_line(&mut self) -> Result<Option<Vec<u8>>, ScanError> {
        let mut buf = Vec::new();
        let n = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ScanError::Cancelled),
            n = self.inner.read_until(b'\n', &mut buf) => n?,
        };
        if n == 0 {
            Ok(None)
        } else {
            Ok(Some(buf))
        }
    }

    /// Next header, or `None` once the blank separator line is reached.
    ///
    /// Stream end before the separator is [`ScanError::HeaderEof`]; an
    /// undecodable progress payload is [`ScanError::Progress`].
    pub async fn next_header(&mut self) -> Result<Option<Header>, ScanError> {
        let raw = self.read_line().await?.ok_or(ScanError::HeaderEof)?;
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        match Progress::payload_of(line) {
            Some(payload) => Progress::decode(payload)
                .map(|p| Some(Header::Progress(p)))
                .map_err(|source| ScanError::Progress {
                    raw: payload.to_string(),
                    source,
                }),
            None => Ok(Some(Header::Other(line.to_string()))),
        }
    }

    /// Discard the whole header block, progress included.
    pub async fn skip_headers(&mut self) -> Result<(), ScanError> {
        while self.next_header().await?.is_some() {}
        Ok(())
    }

    /// Next body line with its terminator, or `None` at stream end. A
    /// final line without a newline is still returned.
    pub async fn next_line(&mut self) -> Result<Option<Vec<u8>>, ScanError> {
        self.read_line().await
    }

    /// Remaining body as lines without their `\n`, blank edges removed.
    /// A `\r` before the newline is data and is kept.
    pub async fn read_body(&mut self) -> Result<Vec<Vec<u8>>, ScanError> {
        let mut lines = Vec::new();
        while let Some(mut line) = self.next_line().await? {
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            lines.push(line);
        }
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        let leading = lines.iter().take_while(|l| l.is_empty()).count();
        lines.drain(..leading);
        Ok(lines)
    }
}
