//! Properties of the emitted record stream.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use elections_logs::context;
use elections_logs::logging::{
    Context, EmitError, Emitter, EmitterConfig, FileSink, Level, LogRecord, MemorySink, Output,
};
use serde::ser::{Error as _, Serialize, Serializer};
use serde_json::Value;

fn memory_emitter() -> (Emitter, Arc<MemorySink>) {
    Emitter::in_memory(EmitterConfig::default())
}

#[test]
fn test_one_line_per_emit_for_every_level() {
    for level in Level::ALL {
        let (emitter, sink) = memory_emitter();
        emitter.emit(level.as_str(), "ballots counted", Context::new()).unwrap();

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        let value: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["level"], level.as_str());
        assert_eq!(value["message"], "ballots counted");
        for field in ["timestamp", "logger", "module", "function", "line"] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
    }
}

#[test]
fn test_invalid_level_rejected() {
    let (emitter, sink) = memory_emitter();
    for bad in ["VERBOSE", "", "TRACE", "notice"] {
        assert!(matches!(
            emitter.emit(bad, "x", Context::new()),
            Err(EmitError::InvalidLevel(_))
        ));
    }
    assert!(sink.is_empty());
}

struct Unserializable;

impl Serialize for Unserializable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(S::Error::custom("socket handles cannot be serialized"))
    }
}

#[test]
fn test_unserializable_value_still_emits() {
    let (emitter, sink) = memory_emitter();
    emitter
        .emit(
            "INFO",
            "vote recorded",
            Context::new().with("conn", Unserializable).with("bureau", "B-12"),
        )
        .unwrap();

    let values = sink.values();
    assert_eq!(values.len(), 1);
    let value = &values[0];
    assert_eq!(value["message"], "vote recorded");
    assert_eq!(value["bureau"], "B-12");
    assert!(value.get("conn").is_none());
    let error = value["serialization_error"].as_str().unwrap();
    assert!(error.contains("conn"));
    assert!(error.contains("socket handles cannot be serialized"));
}

#[test]
fn test_concurrent_emitters_never_interleave() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 200;

    let (emitter, sink) = memory_emitter();
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let emitter = emitter.child(format!("worker-{}", t));
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    emitter
                        .info(format!("{}-{}", t, i), context! { "payload" => "x".repeat(512) })
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let lines = sink.lines();
    assert_eq!(lines.len(), THREADS * PER_THREAD);
    let mut seen = HashSet::new();
    for line in &lines {
        let value: Value = serde_json::from_str(line).expect("interleaved line");
        assert!(seen.insert(value["message"].as_str().unwrap().to_string()));
    }

    let records = sink.records();
    assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn test_concurrent_file_writes_are_whole_lines() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("logs").join("app.log");
    let emitter = Emitter::new(
        EmitterConfig::default(),
        vec![Output::json(Arc::new(FileSink::open(&path).unwrap()))],
    );

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let emitter = emitter.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    emitter.warning(format!("{}:{}", t, i), Context::new()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    emitter.flush().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.ends_with('\n'));
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 400);
    for line in lines {
        let record: LogRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.level, Level::Warning);
    }
}

#[test]
fn test_round_trip_preserves_value() {
    let (emitter, sink) = memory_emitter();
    emitter
        .error(
            "count mismatch",
            context! {
                "bureau_id" => 17,
                "expected" => 1024,
                "ratio" => 0.5,
                "tags" => vec!["audit", "region-3"],
                "nested" => serde_json::json!({ "a": [1, 2, { "b": null }] }),
            },
        )
        .unwrap();

    let line = &sink.lines()[0];
    let original: Value = serde_json::from_str(line).unwrap();
    let record: LogRecord = serde_json::from_str(line).unwrap();
    let reserialized = serde_json::to_value(&record).unwrap();
    assert_eq!(original, reserialized);
}

#[test]
fn test_database_failure_scenario() {
    let (emitter, sink) = memory_emitter();
    emitter
        .emit(
            "ERROR",
            "database connection failed",
            context! { "module" => "main", "line" => 42 },
        )
        .unwrap();

    let value = &sink.values()[0];
    assert_eq!(value["level"], "ERROR");
    assert_eq!(value["message"], "database connection failed");
    assert_eq!(value["module"], "main");
    assert_eq!(value["line"], 42);
    let ts = value["timestamp"].as_str().unwrap();
    assert!(elections_logs::logging::record::parse_timestamp(ts).is_ok());
    assert!(ts.ends_with('Z'));
}

#[test]
fn test_emitted_lines_are_indexable() {
    let (emitter, sink) = memory_emitter();
    emitter.info("API started", Context::new()).unwrap();
    emitter.critical("disk full", Context::new()).unwrap();

    let pattern = elections_logs::index::IndexPattern::default();
    for line in sink.lines() {
        let doc = elections_logs::index::to_document(&line).unwrap();
        assert!(pattern.index_for(&doc.timestamp).starts_with("elections-logs-"));
        assert!(doc.body.contains_key("@timestamp"));
    }
}
