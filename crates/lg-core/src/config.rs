//! # Scan Configuration
//!
//! The full parameter set of one explorer invocation. Built once by the
//! binary and handed to every component by reference; components never
//! mutate it. The tail loop derives a fresh value per cycle with
//! [`ScanConfig::with_lower_bound`].

/// Immutable parameters of a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Fixed-string search term (substring match on `text_field`).
    pub fixed: Option<String>,
    /// Regex search term (matched server-side on `text_field`).
    pub regex: Option<String>,
    /// Raw filter fragment spliced into WHERE, parenthesized.
    pub raw_filter: Option<String>,
    /// Exclusive lower time bound (`time > ...`).
    pub after: Option<String>,
    /// Exclusive upper time bound (`time < ...`).
    pub before: Option<String>,
    /// Column the search terms are matched against.
    pub text_field: String,
    /// Comma-separated payload columns selected after `time,millis`.
    pub fields: String,
    /// Table to scan.
    pub table: String,
    /// Row cap for the main scan; 0 means unlimited.
    pub limit: u64,
    /// Newest-first ordering when true.
    pub reverse: bool,
    /// Context rows preceding each match in output order.
    pub before_lines: u64,
    /// Context rows following each match in output order.
    pub after_lines: u64,
    /// `host:port` of the query service.
    pub endpoint: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            fixed: None,
            regex: None,
            raw_filter: None,
            after: None,
            before: None,
            text_field: "review_body".to_string(),
            fields: "review_body".to_string(),
            table: "amazon".to_string(),
            limit: 0,
            reverse: true,
            before_lines: 0,
            after_lines: 0,
            endpoint: "localhost:8123".to_string(),
        }
    }
}

impl ScanConfig {
    /// True when any context window was requested.
    pub fn wants_context(&self) -> bool {
        self.before_lines > 0 || self.after_lines > 0
    }

    /// Copy of this config with a new exclusive lower bound.
    pub fn with_lower_bound(&self, after: impl Into<String>) -> Self {
        Self {
            after: Some(after.into()),
            ..self.clone()
        }
    }

    /// Copy of this config forced into oldest-first ordering.
    pub fn forward(&self) -> Self {
        Self {
            reverse: false,
            ..self.clone()
        }
    }
}

/// Collapse empty strings to `None`. CLI and config layers use this so
/// an empty flag value never yields an empty predicate.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_table() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.table, "amazon");
        assert_eq!(cfg.endpoint, "localhost:8123");
        assert!(cfg.reverse);
        assert!(!cfg.wants_context());
    }

    #[test]
    fn test_with_lower_bound_leaves_source_untouched() {
        let cfg = ScanConfig::default();
        let next = cfg.with_lower_bound("2024-01-01 00:00:00");
        assert_eq!(cfg.after, None);
        assert_eq!(next.after.as_deref(), Some("2024-01-01 00:00:00"));
        assert_eq!(next.table, cfg.table);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("x".into())), Some("x".into()));
        assert_eq!(non_empty(None), None);
    }
}
