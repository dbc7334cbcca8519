//! The log record wire shape.
//!
//! One record serializes to one JSON object:
//!
//! ```text
//! {"timestamp":"2025-01-21T10:15:30.123456Z","level":"ERROR","logger":"elections",
//!  "message":"database connection failed","module":"main","function":"startup",
//!  "line":42, ...context}
//! ```
//!
//! Field names are consumed verbatim by the collector's parsing rules, so
//! renaming any of them is a breaking change.

use std::panic::Location;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::logging::level::Level;

/// Keys owned by the record itself. Context can never replace them.
pub const RESERVED_FIELDS: [&str; 3] = ["timestamp", "level", "message"];

/// Source location of an emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callsite {
    pub module: String,
    pub function: String,
    pub line: u32,
}

impl Callsite {
    pub fn new(module: impl Into<String>, function: impl Into<String>, line: u32) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
            line,
        }
    }

    /// Callsite from a `#[track_caller]` location. Rust does not expose the
    /// enclosing function there, so `function` is `"unknown"`.
    pub fn from_location(location: &Location<'_>) -> Self {
        let module = Path::new(location.file())
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");
        Self::new(module, "unknown", location.line())
    }
}

/// Capture the current source file stem, function and line as a [`Callsite`].
#[macro_export]
macro_rules! callsite {
    () => {{
        fn __here() {}
        fn __name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let mut path = __name_of(__here).trim_end_matches("::__here");
        while let Some(outer) = path.strip_suffix("::{{closure}}") {
            path = outer;
        }
        let function = path.rsplit("::").next().unwrap_or(path);
        let module = ::std::path::Path::new(file!())
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(module_path!());
        $crate::logging::Callsite::new(module, function, line!())
    }};
}

/// A single structured log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub logger: String,
    pub message: String,
    pub module: String,
    pub function: String,
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialization_error: Option<String>,
    /// Context fields, flattened to the top level.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogRecord {
    /// Render as one JSON line, without the trailing newline.
    ///
    /// Every field is already a JSON value, so this only fails on a broken
    /// `Serialize` impl; the fallback keeps the three required fields.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({
                "timestamp": format_timestamp(&self.timestamp),
                "level": self.level.as_str(),
                "message": self.message,
                "serialization_error": e.to_string(),
            })
            .to_string()
        })
    }

    /// Human console rendering: `<timestamp> - <logger> - <LEVEL> - <message>`.
    pub fn to_text_line(&self) -> String {
        let mut line = format!(
            "{} - {} - {} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
            self.logger,
            self.level,
            self.message
        );
        if let Some(exception) = &self.exception {
            line.push('\n');
            line.push_str(exception);
        }
        line
    }
}

/// RFC 3339, UTC, microsecond precision, `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}

mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}
