//! Emitter error types.

use thiserror::Error;

/// Errors surfaced by [`Emitter`](crate::logging::Emitter) calls.
///
/// Context serialization failures are deliberately absent: they degrade the
/// record (`serialization_error`) instead of failing the call.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Caller supplied a severity outside DEBUG/INFO/WARNING/ERROR/CRITICAL.
    #[error("invalid log level: {0:?}")]
    InvalidLevel(String),

    /// A sink rejected the write. Not retried.
    #[error("log sink write failed: {0}")]
    Sink(#[from] std::io::Error),
}

/// Errors building the process-wide logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error(transparent)]
    Level(#[from] EmitError),

    #[error("failed to open log file {path}: {source}")]
    OpenFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}
