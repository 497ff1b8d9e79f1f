//! Raw log loading.
//!
//! Lines are decoded lossily, trimmed, and blank lines dropped. Each
//! remaining line keeps its 1-based position in the file as its line id and
//! is split into fields by the [`LogFormat`]. Lines the format rejects are
//! collected with their ids and persisted as `failed_logs.json`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use super::format::LogFormat;
use crate::error::Result;
use crate::pool;

/// One successfully parsed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// 1-based position of the line in the input.
    pub line_id: usize,
    /// Field values, in header order.
    pub fields: Vec<String>,
}

/// Parsed lines, row-major, with the header names of the format.
#[derive(Debug, Clone, Default)]
pub struct LogTable {
    headers: Vec<String>,
    records: Vec<LogRecord>,
}

impl LogTable {
    /// Build a table directly from records.
    pub fn new(headers: Vec<String>, records: Vec<LogRecord>) -> Self {
        Self { headers, records }
    }

    /// Header names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// All rows in input order.
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.records.iter().map(|r| r.fields[idx].as_str()).collect())
    }

    /// Values of the `Content` column.
    pub fn content(&self) -> Option<Vec<&str>> {
        self.column(super::format::CONTENT_FIELD)
    }
}

/// What loading produced.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    /// Successfully parsed lines.
    pub table: LogTable,
    /// Rejected lines keyed by line id.
    pub failed: BTreeMap<usize, String>,
    /// Number of physical lines read, blank lines included.
    pub total_lines: usize,
}

impl LoadOutcome {
    /// Fraction of non-blank lines that parsed.
    pub fn load_rate(&self) -> f64 {
        let attempted = self.table.len() + self.failed.len();
        if attempted == 0 {
            return 0.0;
        }
        self.table.len() as f64 / attempted as f64
    }
}

/// Loads raw log text into a [`LogTable`].
#[derive(Debug, Clone)]
pub struct LogLoader {
    format: LogFormat,
    workers: usize,
}

impl LogLoader {
    /// Create a loader with the given format and worker count.
    pub fn new(format: LogFormat, workers: usize) -> Self {
        Self { format, workers }
    }

    /// The format lines are split with.
    pub fn format(&self) -> &LogFormat {
        &self.format
    }

    /// Load a log file.
    pub fn load_file(&self, path: &Path) -> Result<LoadOutcome> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        log::info!("Loading {} ({} bytes)", path.display(), bytes.len());
        self.load_text(&text)
    }

    /// Load text holding one log line per line.
    pub fn load_text(&self, text: &str) -> Result<LoadOutcome> {
        let lines: Vec<&str> = text.lines().collect();
        self.load_lines(&lines)
    }

    /// Load already split lines.
    pub fn load_lines<S: AsRef<str> + Sync>(&self, lines: &[S]) -> Result<LoadOutcome> {
        let numbered: Vec<(usize, &str)> = lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| {
                let line = line.as_ref().trim();
                (!line.is_empty()).then_some((idx + 1, line))
            })
            .collect();

        let slices = pool::run_partitioned(&numbered, self.workers, "log loading", |slice| {
            self.extract_slice(slice)
        })?;

        let mut records = Vec::with_capacity(numbered.len());
        let mut failed = BTreeMap::new();
        for (ok, bad) in slices {
            records.extend(ok);
            failed.extend(bad);
        }

        if !failed.is_empty() {
            log::warn!(
                "{} of {} line(s) did not match format {:?}",
                failed.len(),
                numbered.len(),
                self.format.as_str()
            );
        }
        log::debug!("Loaded {} record(s) from {} line(s)", records.len(), lines.len());

        Ok(LoadOutcome {
            table: LogTable::new(self.format.headers().to_vec(), records),
            failed,
            total_lines: lines.len(),
        })
    }

    fn extract_slice(&self, slice: &[(usize, &str)]) -> (Vec<LogRecord>, Vec<(usize, String)>) {
        let mut records = Vec::with_capacity(slice.len());
        let mut failed = Vec::new();
        for &(line_id, line) in slice {
            match self.format.extract(line) {
                Some(fields) => records.push(LogRecord { line_id, fields }),
                None => failed.push((line_id, line.to_string())),
            }
        }
        (records, failed)
    }
}
