//! Destinations for rendered records.
//!
//! # Responsibilities
//! - Append one newline-terminated line per call
//! - Keep each line a single write so tailing collectors never see a partial record
//!
//! # Design Decisions
//! - Sinks are synchronous and local (file or stream); shipping to the indexer
//!   is the collector's job
//! - Files are opened in append mode and written without an extra buffer, so
//!   every record is visible to `tail -F` as soon as `emit` returns
//! - A poisoned lock is recovered; a panic elsewhere must not silence logging

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logging::record::LogRecord;

/// A line-oriented log destination.
pub trait Sink: Send + Sync {
    /// Write `line` followed by `\n`.
    fn write_line(&self, line: &str) -> io::Result<()>;

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn terminated(line: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    buf
}

/// Append-only file sink.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Open `path` for appending, creating missing parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        lock(&self.file).write_all(&terminated(line))
    }

    fn flush(&self) -> io::Result<()> {
        lock(&self.file).flush()
    }
}

/// Process standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        io::stdout().lock().write_all(&terminated(line))
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}

/// Process standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl Sink for StderrSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        io::stderr().lock().write_all(&terminated(line))
    }
}

/// In-memory sink for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured lines, without trailing newlines.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }

    /// Captured lines parsed as JSON. Lines that are not JSON are skipped.
    pub fn values(&self) -> Vec<Value> {
        lock(&self.lines)
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Captured lines parsed as [`LogRecord`]s.
    pub fn records(&self) -> Vec<LogRecord> {
        lock(&self.lines)
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.lines).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.lines).is_empty()
    }

    pub fn clear(&self) {
        lock(&self.lines).clear();
    }
}

impl Sink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        lock(&self.lines).push(line.to_string());
        Ok(())
    }
}

/// How records are rendered for an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Newline-delimited JSON, the collector contract.
    #[default]
    Json,
    /// `<timestamp> - <logger> - <LEVEL> - <message>` for humans.
    Text,
}

impl Format {
    pub fn render(&self, record: &LogRecord) -> String {
        match self {
            Format::Json => record.to_json_line(),
            Format::Text => record.to_text_line(),
        }
    }
}

/// A sink paired with its rendering.
#[derive(Clone)]
pub struct Output {
    pub sink: Arc<dyn Sink>,
    pub format: Format,
}

impl Output {
    pub fn json(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            format: Format::Json,
        }
    }

    pub fn text(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            format: Format::Text,
        }
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output").field("format", &self.format).finish()
    }
}
