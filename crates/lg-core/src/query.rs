//! # Predicate Builder & Query Assembly
//!
//! Turns a [`ScanConfig`] into the query texts sent to the service:
//!
//! ```text
//! SELECT time,millis,<fields> FROM <table>
//! WHERE 1=1 AND (<raw filter>) AND position(...) <> 0 AND ...
//! ORDER BY time DESC, millis DESC
//! LIMIT <n>
//! FORMAT TabSeparatedRaw
//! ```
//!
//! Context queries fetch the rows nearest to one match on one side,
//! pinned to a single server thread so ties come back in a stable order.

use crate::config::ScanConfig;
use crate::escape::escape;
use crate::row::RowKey;

/// Always-true base predicate so the conjunction is never empty.
pub const BASE_PREDICATE: &str = "1=1";

/// Output format requested from the service: raw TSV, no header row.
pub const OUTPUT_FORMAT: &str = "TabSeparatedRaw";

/// Server-side sort direction on `(time, millis)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    pub fn from_reverse(reverse: bool) -> Self {
        if reverse {
            Self::Descending
        } else {
            Self::Ascending
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Ascending => "",
            Self::Descending => " DESC",
        }
    }

    /// `ORDER BY` clause for the composite key.
    pub fn clause(self) -> String {
        format!("ORDER BY time{0}, millis{0}", self.suffix())
    }
}

/// Which side of a match a context window sits on, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSide {
    Before,
    After,
}

impl std::fmt::Display for ContextSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

/// Build the ordered predicate list for the main scan.
///
/// Order: base, raw filter, fixed string, regex, upper bound, lower bound.
/// Fixed and regex terms are both applied when both are present.
pub fn predicates(cfg: &ScanConfig) -> Vec<String> {
    let mut conds = vec![BASE_PREDICATE.to_string()];

    if let Some(raw) = &cfg.raw_filter {
        conds.push(format!("({raw})"));
    }
    if let Some(fixed) = &cfg.fixed {
        conds.push(format!("position({}, '{}') <> 0", cfg.text_field, escape(fixed)));
    }
    if let Some(regex) = &cfg.regex {
        conds.push(format!("match({}, '{}') = 1", cfg.text_field, escape(regex)));
    }
    if let Some(before) = &cfg.before {
        conds.push(format!("time < toDateTime('{}')", escape(before)));
    }
    if let Some(after) = &cfg.after {
        conds.push(format!("time > toDateTime('{}')", escape(after)));
    }

    conds
}

/// Join predicates into a single WHERE expression.
pub fn filter_expression(cfg: &ScanConfig) -> String {
    predicates(cfg).join(" AND ")
}

/// Full text of the main scan query.
pub fn scan_query(cfg: &ScanConfig) -> String {
    let mut lines = vec![
        format!("SELECT time,millis,{}", cfg.fields),
        format!("FROM {}", cfg.table),
        format!("WHERE {}", filter_expression(cfg)),
        Order::from_reverse(cfg.reverse).clause(),
    ];
    if cfg.limit != 0 {
        lines.push(format!("LIMIT {}", cfg.limit));
    }
    lines.push(format!("FORMAT {OUTPUT_FORMAT}"));
    lines.join("\n")
}

/// A bounded query fetching one context window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextQuery {
    pub text: String,
    /// Server-side order the rows arrive in (nearest to the match first).
    pub fetch_order: Order,
    /// True when the fetched slice must be flipped into output order.
    pub reverse_rows: bool,
}

/// Build the query for `count` rows adjacent to `key` on `side`.
///
/// Rows are fetched nearest-first. In reverse mode the "before" window
/// holds later events and the "after" window earlier ones, so each
/// window lines up with the surrounding scan output.
pub fn context_query(cfg: &ScanConfig, key: &RowKey, side: ContextSide, count: u64) -> ContextQuery {
    let later = matches!(
        (cfg.reverse, side),
        (true, ContextSide::Before) | (false, ContextSide::After)
    );
    let (comparison, fetch_order) = if later {
        (">", Order::Ascending)
    } else {
        ("<", Order::Descending)
    };
    let output_order = Order::from_reverse(cfg.reverse);
    let ts = escape(&key.timestamp);

    let text = [
        format!("SELECT time,millis,{} FROM {}", cfg.fields, cfg.table),
        format!(
            "WHERE (time = '{ts}' AND millis {comparison} {}) OR (time {comparison} '{ts}')",
            key.millis
        ),
        fetch_order.clause(),
        format!("LIMIT {count}"),
        "SETTINGS max_threads=1".to_string(),
        format!("FORMAT {OUTPUT_FORMAT}"),
    ]
    .join("\n");

    ContextQuery {
        text,
        fetch_order,
        reverse_rows: fetch_order != output_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(ts: &str, millis: u32) -> RowKey {
        RowKey {
            timestamp: ts.to_string(),
            millis,
        }
    }

    #[test]
    fn test_empty_config_is_trivially_true() {
        let cfg = ScanConfig::default();
        assert_eq!(predicates(&cfg), vec!["1=1".to_string()]);
        assert_eq!(filter_expression(&cfg), "1=1");
    }

    #[test]
    fn test_predicates_in_order() {
        let cfg = ScanConfig {
            fixed: Some("it's".into()),
            regex: Some("err(or)?".into()),
            raw_filter: Some("vine='Y' OR star_rating>4".into()),
            before: Some("2024-02-01 00:00:00".into()),
            after: Some("2024-01-01 00:00:00".into()),
            ..ScanConfig::default()
        };
        assert_eq!(
            predicates(&cfg),
            vec![
                "1=1".to_string(),
                "(vine='Y' OR star_rating>4)".to_string(),
                "position(review_body, 'it\\'s') <> 0".to_string(),
                "match(review_body, 'err(or)?') = 1".to_string(),
                "time < toDateTime('2024-02-01 00:00:00')".to_string(),
                "time > toDateTime('2024-01-01 00:00:00')".to_string(),
            ]
        );
    }

    #[test]
    fn test_scan_query_reverse_with_limit() {
        let cfg = ScanConfig {
            fixed: Some("error".into()),
            limit: 10,
            table: "logs".into(),
            fields: "level,message".into(),
            text_field: "message".into(),
            ..ScanConfig::default()
        };
        let q = scan_query(&cfg);
        assert_eq!(
            q,
            "SELECT time,millis,level,message\n\
             FROM logs\n\
             WHERE 1=1 AND position(message, 'error') <> 0\n\
             ORDER BY time DESC, millis DESC\n\
             LIMIT 10\n\
             FORMAT TabSeparatedRaw"
        );
    }

    #[test]
    fn test_scan_query_forward_without_limit() {
        let cfg = ScanConfig {
            reverse: false,
            ..ScanConfig::default()
        };
        let q = scan_query(&cfg);
        assert!(q.contains("ORDER BY time, millis\n"));
        assert!(!q.contains("LIMIT"));
        assert!(!q.contains("max_threads"));
    }

    #[test]
    fn test_context_reverse_before_fetches_later_rows_ascending() {
        let cfg = ScanConfig::default();
        let q = context_query(&cfg, &key("2024-01-01 00:00:00", 700), ContextSide::Before, 1);
        assert!(q.text.contains(
            "WHERE (time = '2024-01-01 00:00:00' AND millis > 700) OR (time > '2024-01-01 00:00:00')"
        ));
        assert!(q.text.contains("ORDER BY time, millis\n"));
        assert!(q.text.contains("LIMIT 1\nSETTINGS max_threads=1"));
        assert_eq!(q.fetch_order, Order::Ascending);
        assert!(q.reverse_rows);
    }

    #[test]
    fn test_context_reverse_after_fetches_earlier_rows_descending() {
        let cfg = ScanConfig::default();
        let q = context_query(&cfg, &key("2024-01-01 00:00:00", 700), ContextSide::After, 3);
        assert!(q.text.contains("millis < 700) OR (time < '2024-01-01 00:00:00')"));
        assert_eq!(q.fetch_order, Order::Descending);
        assert!(!q.reverse_rows);
    }

    #[test]
    fn test_context_forward_mode() {
        let cfg = ScanConfig {
            reverse: false,
            ..ScanConfig::default()
        };
        let before = context_query(&cfg, &key("2024-01-01 00:00:00", 1), ContextSide::Before, 2);
        assert!(before.text.contains("millis < 1)"));
        assert_eq!(before.fetch_order, Order::Descending);
        assert!(before.reverse_rows);

        let after = context_query(&cfg, &key("2024-01-01 00:00:00", 1), ContextSide::After, 2);
        assert!(after.text.contains("millis > 1)"));
        assert_eq!(after.fetch_order, Order::Ascending);
        assert!(!after.reverse_rows);
    }

    #[test]
    fn test_context_ignores_search_predicates() {
        let cfg = ScanConfig {
            fixed: Some("error".into()),
            ..ScanConfig::default()
        };
        let q = context_query(&cfg, &key("2024-01-01 00:00:00", 0), ContextSide::After, 1);
        assert!(!q.text.contains("position("));
    }
}
