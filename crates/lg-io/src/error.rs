//! Scan error taxonomy.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// Transport failure on the connection or the output stream.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The connection closed before the blank line ending the headers.
    #[error("unexpected end of stream while reading headers")]
    HeaderEof,

    /// A progress header whose payload could not be decoded.
    #[error("unmarshalling {raw:?}: {source}")]
    Progress {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// The cancellation token fired while a read or sleep was pending.
    #[error("scan cancelled")]
    Cancelled,
}

impl ScanError {
    /// True for outcomes that end the process successfully: the
    /// downstream reader went away, or a terminate signal arrived.
    pub fn is_clean_shutdown(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Io(e) => e.kind() == io::ErrorKind::BrokenPipe,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broken_pipe_is_clean() {
        let err = ScanError::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert!(err.is_clean_shutdown());
        assert!(ScanError::Cancelled.is_clean_shutdown());
    }

    #[test]
    fn test_other_errors_are_fatal() {
        let err = ScanError::from(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert!(!err.is_clean_shutdown());
        assert!(!ScanError::HeaderEof.is_clean_shutdown());
    }

    #[test]
    fn test_progress_error_includes_raw_payload() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = ScanError::Progress {
            raw: "{oops".into(),
            source,
        };
        assert!(err.to_string().contains("\"{oops\""));
    }
}
