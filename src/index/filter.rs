//! Query filters over indexed documents.
//!
//! Supports the filters the visualization layer exposes: exact match on
//! `level` (also spelled `log_level`), substring match on `message`, plus
//! time bounds on `@timestamp`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::index::document::Document;
use crate::logging::record::parse_timestamp;
use crate::logging::Level;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("filter term {0:?} is not of the form field:value")]
    Malformed(String),

    #[error("unknown filter field {0:?} (expected level, log_level, message, since, until)")]
    UnknownField(String),

    #[error("invalid level in filter: {0:?}")]
    Level(String),

    #[error("invalid timestamp in filter: {0:?}")]
    Timestamp(String),
}

/// Conjunction of optional conditions. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub level: Option<Level>,
    pub message_contains: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn message_contains(mut self, needle: impl Into<String>) -> Self {
        self.message_contains = Some(needle.into());
        self
    }

    pub fn since(mut self, ts: DateTime<Utc>) -> Self {
        self.since = Some(ts);
        self
    }

    pub fn until(mut self, ts: DateTime<Utc>) -> Self {
        self.until = Some(ts);
        self
    }

    /// Apply one `field:value` term, e.g. `log_level:ERROR` or `message:timeout`.
    pub fn apply_term(&mut self, term: &str) -> Result<(), FilterError> {
        let (field, value) = term
            .split_once(':')
            .ok_or_else(|| FilterError::Malformed(term.to_string()))?;
        match field.trim() {
            "level" | "log_level" => {
                self.level = Some(
                    value
                        .parse()
                        .map_err(|_| FilterError::Level(value.to_string()))?,
                );
            }
            "message" => self.message_contains = Some(value.to_string()),
            "since" => self.since = Some(parse_bound(value)?),
            "until" => self.until = Some(parse_bound(value)?),
            other => return Err(FilterError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    /// Build a filter from a single term.
    pub fn parse_term(term: &str) -> Result<Self, FilterError> {
        let mut filter = Self::new();
        filter.apply_term(term)?;
        Ok(filter)
    }

    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(level) = self.level {
            if doc.level() != Some(level.as_str()) {
                return false;
            }
        }
        if let Some(needle) = &self.message_contains {
            if !doc.message().is_some_and(|m| m.contains(needle.as_str())) {
                return false;
            }
        }
        if self.since.is_some_and(|since| doc.timestamp < since) {
            return false;
        }
        if self.until.is_some_and(|until| doc.timestamp > until) {
            return false;
        }
        true
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    /// Whitespace-separated terms: `level:ERROR message:database`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut filter = Self::new();
        for term in s.split_whitespace() {
            filter.apply_term(term)?;
        }
        Ok(filter)
    }
}

fn parse_bound(raw: &str) -> Result<DateTime<Utc>, FilterError> {
    parse_timestamp(raw).map_err(|_| FilterError::Timestamp(raw.to_string()))
}
