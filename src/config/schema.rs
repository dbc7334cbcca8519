//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logging::error::EmitError;
use crate::logging::sink::Format;
use crate::logging::Level;

/// Root configuration for the elections API process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Structured log output.
    pub logging: LoggingConfig,

    /// Metrics settings.
    pub observability: ObservabilityConfig,

    /// Collector-side index naming.
    pub index: IndexConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Structured logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level written (DEBUG, INFO, WARNING, ERROR, CRITICAL).
    pub level: String,

    /// Value of the `logger` field for records not coming from `tracing`.
    pub logger: String,

    /// NDJSON file tailed by the collector. `None` disables the file output.
    pub file: Option<PathBuf>,

    /// Also write records to stdout.
    pub console: bool,

    /// Rendering used for stdout.
    pub console_format: Format,

    /// Fields added to every record.
    pub context: BTreeMap<String, toml::Value>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            logger: "elections".to_string(),
            file: Some(PathBuf::from("logs/app.log")),
            console: true,
            console_format: Format::Text,
            context: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Configured threshold. Config files may use any case and surrounding
    /// whitespace; the emitter itself only takes canonical names.
    pub fn threshold(&self) -> Result<Level, EmitError> {
        self.level
            .trim()
            .to_ascii_uppercase()
            .parse()
            .map_err(|_| EmitError::InvalidLevel(self.level.clone()))
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Index naming used by the collector.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Daily indices are named `<prefix>YYYY.MM.DD`.
    pub prefix: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            prefix: crate::index::DEFAULT_PREFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
        assert_eq!(config.logging.level, "INFO");
        assert_eq!(config.logging.file, Some(PathBuf::from("logs/app.log")));
        assert_eq!(config.index.prefix, "elections-logs-");
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [logging]
            level = "DEBUG"
            console_format = "json"

            [logging.context]
            service = "elections-api"
            replica = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "DEBUG");
        assert_eq!(config.logging.console_format, Format::Json);
        assert_eq!(config.logging.context.len(), 2);
        assert_eq!(config.logging.logger, "elections");
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn test_threshold_normalises_config_spelling() {
        let mut config = LoggingConfig::default();
        config.level = " warning ".into();
        assert_eq!(config.threshold().unwrap(), Level::Warning);

        config.level = "warn".into();
        assert!(matches!(
            config.threshold(),
            Err(EmitError::InvalidLevel(ref l)) if l == "warn"
        ));
    }
}
