//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check the log level names one of the record levels
//! - Check the index prefix is a legal index name prefix
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error("logging.level {0:?} is not one of DEBUG, INFO, WARNING, ERROR, CRITICAL")]
    LogLevel(String),

    #[error("logging.logger must not be empty")]
    EmptyLogger,

    #[error("logging has no output (file unset and console disabled)")]
    NoOutput,

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),

    #[error("index.prefix {0:?} is not a valid index name prefix")]
    IndexPrefix(String),
}

/// Validate `config`, collecting every error.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if config.logging.threshold().is_err() {
        errors.push(ValidationError::LogLevel(config.logging.level.clone()));
    }

    if config.logging.logger.trim().is_empty() {
        errors.push(ValidationError::EmptyLogger);
    }

    if config.logging.file.is_none() && !config.logging.console {
        errors.push(ValidationError::NoOutput);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if !crate::index::is_valid_prefix(&config.index.prefix) {
        errors.push(ValidationError::IndexPrefix(config.index.prefix.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
