//! Bridge from `tracing` events to structured records.
//!
//! Application code keeps using `tracing::info!(request_id = %id, "...")`;
//! this layer turns each event into one record written by the [`Emitter`],
//! so the process produces a single log stream in the collector format.

use std::fmt;
use std::path::Path;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::logging::context::Context;
use crate::logging::emitter::Emitter;
use crate::logging::level::Level;
use crate::logging::record::Callsite;

/// `tracing_subscriber` layer writing every event through an [`Emitter`].
///
/// - `logger`: event target
/// - `module`: source file stem, falling back to the last module path segment
/// - `function`: name of the innermost span, or `"unknown"`
/// - event fields other than `message` become context
#[derive(Debug, Clone)]
pub struct JsonLayer {
    emitter: Emitter,
}

impl JsonLayer {
    pub fn new(emitter: Emitter) -> Self {
        Self { emitter }
    }
}

impl<S> Layer<S> for JsonLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: LayerContext<'_, S>) {
        let meta = event.metadata();
        let level = Level::from_tracing(meta.level());
        if !self.emitter.enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let module = meta
            .file()
            .and_then(|file| Path::new(file).file_stem())
            .and_then(|stem| stem.to_str())
            .or_else(|| meta.module_path().and_then(|p| p.rsplit("::").next()))
            .unwrap_or("unknown");
        let function = ctx
            .event_span(event)
            .map(|span| span.name())
            .unwrap_or("unknown");
        let site = Callsite::new(module, function, meta.line().unwrap_or(0));

        // Sink failures cannot be reported from inside a subscriber.
        let _ = self
            .emitter
            .child(meta.target())
            .log_at(site, level, visitor.message, visitor.context);
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    context: Context,
}

impl FieldVisitor {
    fn skip(field: &Field) -> bool {
        // Metadata copied in by tracing-log.
        field.name().starts_with("log.")
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else if !Self::skip(field) {
            self.context.insert(field.name(), value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if !Self::skip(field) {
            self.context.insert(field.name(), value);
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if !Self::skip(field) {
            self.context.insert(field.name(), value);
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if !Self::skip(field) {
            self.context.insert(field.name(), value);
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if !Self::skip(field) {
            self.context.insert(field.name(), value);
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        if !Self::skip(field) {
            self.context.insert(field.name(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else if !Self::skip(field) {
            self.context.insert(field.name(), format!("{:?}", value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::emitter::EmitterConfig;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_event_becomes_record() {
        let (emitter, sink) = Emitter::in_memory(EmitterConfig::default());
        let subscriber = tracing_subscriber::registry().with(JsonLayer::new(emitter));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "elections.db", attempt = 3, ok = false, host = %"db:5432", "retrying connection");
        });

        let value = &sink.values()[0];
        assert_eq!(value["level"], "WARNING");
        assert_eq!(value["logger"], "elections.db");
        assert_eq!(value["message"], "retrying connection");
        assert_eq!(value["attempt"], 3);
        assert_eq!(value["ok"], false);
        assert_eq!(value["host"], "db:5432");
        assert_eq!(value["module"], "layer");
        assert_eq!(value["function"], "unknown");
    }

    #[test]
    fn test_span_name_is_function() {
        let (emitter, sink) = Emitter::in_memory(EmitterConfig::default());
        let subscriber = tracing_subscriber::registry().with(JsonLayer::new(emitter));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("create_tables");
            let _guard = span.enter();
            tracing::error!("initialisation failed");
        });

        let value = &sink.values()[0];
        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["function"], "create_tables");
    }

    #[test]
    fn test_threshold_applies() {
        let (emitter, sink) = Emitter::in_memory(EmitterConfig {
            threshold: Level::Info,
            ..EmitterConfig::default()
        });
        let subscriber = tracing_subscriber::registry().with(JsonLayer::new(emitter));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("noise");
            tracing::trace!("more noise");
            tracing::info!("signal");
        });

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.values()[0]["message"], "signal");
    }
    #[test]
    fn test_threshold_field_survives_reserved_level() {
        let (emitter, sink) = Emitter::in_memory(EmitterConfig::default());
        let subscriber = tracing_subscriber::registry().with(JsonLayer::new(emitter));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(threshold = %Level::Error, "Log level changed");
            tracing::info!(level = %Level::Error, "Log level changed");
        });

        let values = sink.values();
        assert_eq!(values[0]["level"], "INFO");
        assert_eq!(values[0]["threshold"], "ERROR");
        // `level` is record-owned and cannot carry a field value.
        assert_eq!(values[1]["level"], "INFO");
        assert!(values[1].get("threshold").is_none());
    }
}
