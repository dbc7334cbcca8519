//! Bodies of the `elections-logs` commands, over any reader and writer.

use std::io::{self, BufRead, Write};

use serde_json::json;

use crate::index::document::scan;
use crate::index::filter::Filter;
use crate::index::IndexPattern;

/// Line counts of a `validate` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationSummary {
    pub total: usize,
    pub invalid: usize,
}

impl ValidationSummary {
    pub fn valid(&self) -> usize {
        self.total - self.invalid
    }

    pub fn is_clean(&self) -> bool {
        self.invalid == 0
    }
}

/// Write the documents matching `filter`, one per line, stopping after
/// `limit` matches. Lines that are not documents are skipped.
///
/// Returns the number of documents written.
pub fn query<R: BufRead, W: Write>(
    reader: R,
    out: &mut W,
    filter: &Filter,
    limit: Option<usize>,
) -> io::Result<usize> {
    let mut matched = 0usize;
    for scanned in scan(reader) {
        if limit.is_some_and(|limit| matched >= limit) {
            break;
        }
        let Ok(doc) = scanned.outcome else { continue };
        if filter.matches(&doc) {
            writeln!(out, "{}", doc.into_value())?;
            matched += 1;
        }
    }
    out.flush()?;
    Ok(matched)
}

/// Report every line the indexer would drop, then a summary line.
pub fn validate<R: BufRead, W: Write>(reader: R, out: &mut W) -> io::Result<ValidationSummary> {
    let mut summary = ValidationSummary { total: 0, invalid: 0 };
    for scanned in scan(reader) {
        summary.total += 1;
        if let Err(e) = scanned.outcome {
            summary.invalid += 1;
            writeln!(out, "line {}: {}", scanned.line_no, e)?;
        }
    }
    writeln!(
        out,
        "{} lines, {} valid, {} invalid",
        summary.total,
        summary.valid(),
        summary.invalid
    )?;
    out.flush()?;
    Ok(summary)
}

/// Write an Elasticsearch bulk body: an `index` action naming the daily
/// index, then the document, for every valid line.
///
/// Returns the number of skipped lines.
pub fn bulk<R: BufRead, W: Write>(reader: R, out: &mut W, pattern: &IndexPattern) -> io::Result<usize> {
    let mut skipped = 0usize;
    for scanned in scan(reader) {
        match scanned.outcome {
            Ok(doc) => {
                let index = pattern.index_for(&doc.timestamp);
                writeln!(out, "{}", json!({ "index": { "_index": index } }))?;
                writeln!(out, "{}", doc.into_value())?;
            }
            Err(_) => skipped += 1,
        }
    }
    out.flush()?;
    Ok(skipped)
}
