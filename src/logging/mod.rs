//! Structured logging.
//!
//! # Data Flow
//! ```text
//! tracing::info!(...) ──▶ layer.rs (JsonLayer) ──┐
//!                                                ▼
//! Emitter::emit(level, message, context) ──▶ emitter.rs
//!     → level check (level.rs)
//!     → context merge / degrade (context.rs)
//!     → LogRecord (record.rs)
//!     → one line per output (sink.rs: file NDJSON, stdout text/JSON, memory)
//! ```
//!
//! # Design Decisions
//! - One record per line, one write per record, under one lock
//! - Sinks are local; the external collector tails the file
//! - Setup is built from `LoggingConfig` and returned, never stored globally;
//!   the `tracing` dispatcher is the only global, installed by `init`

pub mod context;
pub mod emitter;
pub mod error;
pub mod layer;
pub mod level;
pub mod record;
pub mod sink;

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub use context::{Context, ContextValue};
pub use emitter::{Emitter, EmitterConfig};
pub use error::{EmitError, LoggingError};
pub use layer::JsonLayer;
pub use level::Level;
pub use record::{Callsite, LogRecord};
pub use sink::{FileSink, Format, MemorySink, Output, Sink, StderrSink, StdoutSink};

/// Build an emitter from configuration without installing anything globally.
pub fn build_emitter(config: &LoggingConfig) -> Result<Emitter, LoggingError> {
    let threshold = config.threshold()?;

    let mut context = Context::new();
    for (key, value) in &config.context {
        context.insert(key.clone(), value);
    }

    let mut outputs = Vec::new();
    if let Some(path) = &config.file {
        let sink = FileSink::open(path).map_err(|source| LoggingError::OpenFile {
            path: path.clone(),
            source,
        })?;
        outputs.push(Output::json(Arc::new(sink)));
    }
    if config.console {
        outputs.push(Output {
            sink: Arc::new(StdoutSink),
            format: config.console_format,
        });
    }

    Ok(Emitter::new(
        EmitterConfig {
            logger: config.logger.clone(),
            threshold,
            context,
        },
        outputs,
    ))
}

/// Build the emitter and install it as the `tracing` subscriber.
///
/// `RUST_LOG` narrows which events reach the emitter; the emitter threshold
/// (config `logging.level`, hot-reloadable) decides what is written.
pub fn init(config: &LoggingConfig) -> Result<Emitter, LoggingError> {
    let emitter = build_emitter(config)?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug,hyper=info,h2=info,notify=info".into()),
        )
        .with(JsonLayer::new(emitter.clone()))
        .try_init()?;

    Ok(emitter)
}
