//! The structured log emitter.
//!
//! # Responsibilities
//! - Validate the requested level
//! - Merge default and call context into one record
//! - Degrade records whose context cannot be serialized
//! - Stamp, render and write the record to every output under one lock
//!
//! # Design Decisions
//! - Configuration (outputs, logger name, default context) is passed in, never global
//! - The timestamp is taken while holding the pipeline lock and clamped to
//!   the previous one, so file order and time order agree
//! - Nothing in this module may call `tracing`; the tracing bridge feeds
//!   events back into the emitter and would recurse

use std::error::Error as StdError;
use std::panic::Location;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::logging::context::{Context, ContextValue};
use crate::logging::error::EmitError;
use crate::logging::level::Level;
use crate::logging::record::{Callsite, LogRecord, RESERVED_FIELDS};
use crate::logging::sink::{Format, MemorySink, Output};
use crate::observability::metrics;

/// Emitter settings.
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// Value of the `logger` field.
    pub logger: String,
    /// Records below this level are dropped.
    pub threshold: Level,
    /// Fields added to every record; call context wins on conflict.
    pub context: Context,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            logger: "elections".to_string(),
            threshold: Level::Debug,
            context: Context::new(),
        }
    }
}

struct Pipeline {
    outputs: Vec<Output>,
    last_timestamp: Option<DateTime<Utc>>,
}

/// Cloneable handle writing structured records to a shared set of outputs.
///
/// Clones, [`child`](Emitter::child) and [`with_context`](Emitter::with_context)
/// handles share the outputs, the write lock and the threshold.
#[derive(Clone)]
pub struct Emitter {
    logger: Arc<str>,
    defaults: Arc<Context>,
    threshold: Arc<ArcSwap<Level>>,
    pipeline: Arc<Mutex<Pipeline>>,
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("logger", &self.logger)
            .field("threshold", &self.threshold())
            .finish()
    }
}

impl Emitter {
    pub fn new(config: EmitterConfig, outputs: Vec<Output>) -> Self {
        Self {
            logger: Arc::from(config.logger),
            defaults: Arc::new(config.context),
            threshold: Arc::new(ArcSwap::from_pointee(config.threshold)),
            pipeline: Arc::new(Mutex::new(Pipeline {
                outputs,
                last_timestamp: None,
            })),
        }
    }

    /// Emitter writing JSON to a fresh [`MemorySink`].
    pub fn in_memory(config: EmitterConfig) -> (Self, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let emitter = Self::new(config, vec![Output::json(sink.clone())]);
        (emitter, sink)
    }

    pub fn logger(&self) -> &str {
        &self.logger
    }

    pub fn threshold(&self) -> Level {
        **self.threshold.load()
    }

    /// Change the threshold for this emitter and every handle sharing it.
    pub fn set_threshold(&self, level: Level) {
        self.threshold.store(Arc::new(level));
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.threshold()
    }

    /// Handle with a different `logger` name on the same pipeline.
    pub fn child(&self, logger: impl Into<String>) -> Self {
        Self {
            logger: Arc::from(logger.into()),
            ..self.clone()
        }
    }

    /// Handle whose default context is extended with `context`.
    pub fn with_context(&self, context: Context) -> Self {
        let mut defaults = (*self.defaults).clone();
        defaults.merge(&context);
        Self {
            defaults: Arc::new(defaults),
            ..self.clone()
        }
    }

    /// Emit a record with a level given by name.
    ///
    /// Fails with [`EmitError::InvalidLevel`] without writing anything when
    /// `level` is not one of DEBUG, INFO, WARNING, ERROR, CRITICAL.
    #[track_caller]
    pub fn emit(
        &self,
        level: &str,
        message: impl Into<String>,
        context: Context,
    ) -> Result<(), EmitError> {
        let level: Level = level.parse()?;
        let site = Callsite::from_location(Location::caller());
        self.write(site, level, message.into(), &context, None)
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<String>, context: Context) -> Result<(), EmitError> {
        let site = Callsite::from_location(Location::caller());
        self.write(site, level, message.into(), &context, None)
    }

    /// Emit with an explicit callsite, usually from [`callsite!`](crate::callsite).
    pub fn log_at(
        &self,
        site: Callsite,
        level: Level,
        message: impl Into<String>,
        context: Context,
    ) -> Result<(), EmitError> {
        self.write(site, level, message.into(), &context, None)
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>, context: Context) -> Result<(), EmitError> {
        self.log(Level::Debug, message, context)
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>, context: Context) -> Result<(), EmitError> {
        self.log(Level::Info, message, context)
    }

    #[track_caller]
    pub fn warning(&self, message: impl Into<String>, context: Context) -> Result<(), EmitError> {
        self.log(Level::Warning, message, context)
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>, context: Context) -> Result<(), EmitError> {
        self.log(Level::Error, message, context)
    }

    #[track_caller]
    pub fn critical(&self, message: impl Into<String>, context: Context) -> Result<(), EmitError> {
        self.log(Level::Critical, message, context)
    }

    /// ERROR record carrying `err` and its source chain in `exception`.
    #[track_caller]
    pub fn exception(
        &self,
        message: impl Into<String>,
        err: &(dyn StdError + 'static),
        context: Context,
    ) -> Result<(), EmitError> {
        let site = Callsite::from_location(Location::caller());
        self.write(site, Level::Error, message.into(), &context, Some(render_error_chain(err)))
    }

    /// Flush every output.
    pub fn flush(&self) -> Result<(), EmitError> {
        let pipeline = self.pipeline.lock().unwrap_or_else(PoisonError::into_inner);
        for output in &pipeline.outputs {
            output.sink.flush()?;
        }
        Ok(())
    }

    fn write(
        &self,
        site: Callsite,
        level: Level,
        message: String,
        context: &Context,
        exception: Option<String>,
    ) -> Result<(), EmitError> {
        if !self.enabled(level) {
            metrics::record_log_suppressed(level);
            return Ok(());
        }

        let mut record = self.build(site, level, message, context, exception);
        let degraded = record.serialization_error.is_some();

        let result = {
            let mut pipeline = self.pipeline.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Utc::now();
            let timestamp = match pipeline.last_timestamp {
                Some(last) if last > now => last,
                _ => now,
            };
            pipeline.last_timestamp = Some(timestamp);
            record.timestamp = timestamp;

            let mut first_error = None;
            let mut json_line: Option<String> = None;
            for output in &pipeline.outputs {
                let line = match output.format {
                    Format::Json => {
                        json_line.get_or_insert_with(|| record.to_json_line()).clone()
                    }
                    format => format.render(&record),
                };
                if let Err(e) = output.sink.write_line(&line) {
                    first_error.get_or_insert(e);
                }
            }
            first_error
        };

        match result {
            Some(e) => {
                metrics::record_log_failed(level);
                Err(EmitError::Sink(e))
            }
            None => {
                metrics::record_log_emitted(level, degraded);
                Ok(())
            }
        }
    }

    fn build(
        &self,
        site: Callsite,
        level: Level,
        message: String,
        context: &Context,
        exception: Option<String>,
    ) -> LogRecord {
        let mut record = LogRecord {
            timestamp: Utc::now(),
            level,
            logger: self.logger.to_string(),
            message,
            module: site.module,
            function: site.function,
            line: site.line,
            exception,
            serialization_error: None,
            extra: Map::new(),
        };

        let mut merged = (*self.defaults).clone();
        merged.merge(context);

        let mut issues = Vec::new();
        for (key, value) in merged.iter() {
            if RESERVED_FIELDS.contains(&key) || key == "serialization_error" {
                continue;
            }
            let json = match value {
                ContextValue::Json(json) => json,
                ContextValue::Unserializable { type_name, reason } => {
                    issues.push(format!(
                        "context field `{}` ({}) could not be serialized: {}",
                        key, type_name, reason
                    ));
                    continue;
                }
            };
            match key {
                "logger" => record.logger = as_text(json),
                "module" => record.module = as_text(json),
                "function" => record.function = as_text(json),
                "exception" => record.exception = Some(as_text(json)),
                "line" => match json.as_u64().and_then(|n| u32::try_from(n).ok()) {
                    Some(line) => record.line = line,
                    None => issues.push(format!(
                        "context field `line` expects a non-negative integer, got {}",
                        json
                    )),
                },
                _ => {
                    record.extra.insert(key.to_string(), json.clone());
                }
            }
        }

        if !issues.is_empty() {
            record.serialization_error = Some(issues.join("; "));
        }
        record
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `outer: cause: root cause`, the way `anyhow` prints `{:#}`.
fn render_error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
