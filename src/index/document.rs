//! Mapping emitted lines to indexed documents.

use std::io::BufRead;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::index::TIME_FIELD;
use crate::logging::record::parse_timestamp;

/// Why a line cannot be indexed.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("line is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line is not a JSON object")]
    NotAnObject,

    #[error("required field `{0}` is missing or not a string")]
    MissingField(&'static str),

    #[error("timestamp {0:?} is not RFC 3339")]
    BadTimestamp(String),

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// An indexed document: the record with `timestamp` moved to `@timestamp`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub timestamp: DateTime<Utc>,
    pub body: Map<String, Value>,
}

impl Document {
    pub fn level(&self) -> Option<&str> {
        self.body
            .get("level")
            .or_else(|| self.body.get("log_level"))
            .and_then(Value::as_str)
    }

    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }
}

/// Parse one NDJSON line into a [`Document`].
pub fn to_document(line: &str) -> Result<Document, DocumentError> {
    let value: Value = serde_json::from_str(line)?;
    let Value::Object(mut body) = value else {
        return Err(DocumentError::NotAnObject);
    };

    for field in ["level", "message"] {
        if !body.get(field).is_some_and(Value::is_string) {
            return Err(DocumentError::MissingField(field));
        }
    }

    let raw = match body.remove("timestamp") {
        Some(Value::String(raw)) => raw,
        _ => return Err(DocumentError::MissingField("timestamp")),
    };
    let timestamp = parse_timestamp(&raw).map_err(|_| DocumentError::BadTimestamp(raw.clone()))?;
    body.insert(TIME_FIELD.to_string(), Value::String(raw));

    Ok(Document { timestamp, body })
}

/// One line of a scanned log file.
#[derive(Debug)]
pub struct ScannedLine {
    /// 1-based line number.
    pub line_no: usize,
    pub outcome: Result<Document, DocumentError>,
}

/// Iterate the non-blank lines of `reader` as documents.
pub fn scan<R: BufRead>(reader: R) -> impl Iterator<Item = ScannedLine> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let line_no = idx + 1;
            match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(ScannedLine {
                    line_no,
                    outcome: to_document(&line),
                }),
                Err(e) => Some(ScannedLine {
                    line_no,
                    outcome: Err(DocumentError::Io(e)),
                }),
            }
        })
}
