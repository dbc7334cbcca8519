//! Collector-side contract: index naming, document mapping and query filters.
//!
//! # Data Flow
//! ```text
//! logs/app.log (NDJSON)
//!     → document.rs (parse line, require timestamp/level/message, timestamp → @timestamp)
//!     → IndexPattern::index_for(@timestamp) → "elections-logs-2025.01.21"
//!     → filter.rs (level exact match, message substring, time bounds)
//!     → export.rs (query / validate / bulk output)
//! ```
//!
//! # Design Decisions
//! - Lines missing a required field are rejected, mirroring what the indexer drops
//! - Daily indices, `YYYY.MM.DD` suffix, UTC

pub mod document;
pub mod export;
pub mod filter;

use chrono::{DateTime, Utc};

pub use document::{scan, to_document, Document, DocumentError, ScannedLine};
pub use export::{bulk, query, validate, ValidationSummary};
pub use filter::{Filter, FilterError};

/// Default prefix of the time-series indices.
pub const DEFAULT_PREFIX: &str = "elections-logs-";

/// Field holding the indexing time axis.
pub const TIME_FIELD: &str = "@timestamp";

/// Naming rule for the daily log indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPattern {
    prefix: String,
}

impl IndexPattern {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Wildcard pattern used by the visualization layer.
    pub fn pattern(&self) -> String {
        format!("{}*", self.prefix)
    }

    /// Daily index receiving a record stamped `timestamp`.
    pub fn index_for(&self, timestamp: &DateTime<Utc>) -> String {
        format!("{}{}", self.prefix, timestamp.format("%Y.%m.%d"))
    }

    pub fn matches(&self, index: &str) -> bool {
        index.starts_with(&self.prefix)
    }
}

impl Default for IndexPattern {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Index names must be lowercase, non-empty, must not start with `-`, `_`
/// or `+` and must not contain any of `\ / * ? " < > | , #` or spaces.
pub fn is_valid_prefix(prefix: &str) -> bool {
    const FORBIDDEN: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ',', '#', ' ', ':'];
    !prefix.is_empty()
        && !prefix.starts_with(['-', '_', '+'])
        && !prefix.chars().any(|c| c.is_uppercase() || FORBIDDEN.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_index_naming() {
        let pattern = IndexPattern::default();
        let ts = Utc.with_ymd_and_hms(2025, 1, 21, 23, 59, 59).unwrap();
        assert_eq!(pattern.index_for(&ts), "elections-logs-2025.01.21");
        assert_eq!(pattern.pattern(), "elections-logs-*");
        assert!(pattern.matches("elections-logs-2025.01.21"));
        assert!(!pattern.matches("other-logs-2025.01.21"));
    }

    #[test]
    fn test_prefix_rules() {
        assert!(is_valid_prefix("elections-logs-"));
        assert!(!is_valid_prefix(""));
        assert!(!is_valid_prefix("Elections-"));
        assert!(!is_valid_prefix("_hidden"));
        assert!(!is_valid_prefix("a b"));
        assert!(!is_valid_prefix("logs*"));
    }
}
