//! Run statistics.
//!
//! A [`ZipReport`] is an immutable value built once a run has finished. It is
//! logged at info level by the zipper and returned to the caller; the CLI
//! prints it as a summary or as JSON.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Counts and timings of one compression run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZipReport {
    /// Physical lines in the input, blank lines included.
    pub total_lines: usize,
    /// Lines split into fields.
    pub loaded_lines: usize,
    /// Non-blank lines rejected by the format.
    pub failed_lines: usize,
    /// Loaded lines whose content matched a template.
    pub matched_lines: usize,
    /// Loaded lines whose content matched nothing.
    pub unmatched_lines: usize,
    /// Distinct content strings sent to the matcher.
    pub distinct_contents: usize,
    /// Events assigned, `NoMatch` included.
    pub events: usize,
    /// Column files written.
    pub column_files: usize,
    /// Distinct parameter values in the dictionary.
    pub dictionary_size: usize,
    /// Seconds spent loading, matching and encoding.
    pub split_seconds: f64,
    /// Seconds spent writing and archiving.
    pub pack_seconds: f64,
    /// Size of the input.
    pub raw_bytes: u64,
    /// Size of the archive.
    pub archive_bytes: u64,
    /// Archive location.
    pub archive: PathBuf,
}

impl ZipReport {
    /// Fraction of non-blank lines that loaded.
    pub fn load_rate(&self) -> f64 {
        ratio(self.loaded_lines, self.loaded_lines + self.failed_lines)
    }

    /// Fraction of loaded lines that matched a template.
    pub fn match_rate(&self) -> f64 {
        ratio(self.matched_lines, self.loaded_lines)
    }

    /// Raw size over archive size.
    pub fn compression_ratio(&self) -> f64 {
        if self.archive_bytes > 0 {
            self.raw_bytes as f64 / self.archive_bytes as f64
        } else {
            0.0
        }
    }

    /// Record the split phase duration.
    pub fn set_split_time(&mut self, elapsed: Duration) {
        self.split_seconds = elapsed.as_secs_f64();
    }

    /// Record the pack phase duration.
    pub fn set_pack_time(&mut self, elapsed: Duration) {
        self.pack_seconds = elapsed.as_secs_f64();
    }

    /// Emit the report through `log`.
    pub fn log(&self) {
        log::info!(
            "Loaded {}/{} lines ({:.2}% of non-blank), {} failed",
            self.loaded_lines,
            self.total_lines,
            self.load_rate() * 100.0,
            self.failed_lines
        );
        log::info!(
            "Matched {} lines ({:.2}%), {} unmatched, {} distinct contents, {} events",
            self.matched_lines,
            self.match_rate() * 100.0,
            self.unmatched_lines,
            self.distinct_contents,
            self.events
        );
        log::info!(
            "Split {:.3}s, pack {:.3}s, {} column files, {} -> {} bytes ({:.2}x)",
            self.split_seconds,
            self.pack_seconds,
            self.column_files,
            self.raw_bytes,
            self.archive_bytes,
            self.compression_ratio()
        );
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64
    } else {
        0.0
    }
}

impl fmt::Display for ZipReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Archive:        {}", self.archive.display())?;
        writeln!(
            f,
            "Lines:          {} total, {} loaded, {} failed",
            self.total_lines, self.loaded_lines, self.failed_lines
        )?;
        writeln!(
            f,
            "Matched:        {} ({:.2}%), {} unmatched",
            self.matched_lines,
            self.match_rate() * 100.0,
            self.unmatched_lines
        )?;
        writeln!(
            f,
            "Events:         {} ({} column files, {} dictionary codes)",
            self.events, self.column_files, self.dictionary_size
        )?;
        writeln!(
            f,
            "Time:           split {:.3}s, pack {:.3}s",
            self.split_seconds, self.pack_seconds
        )?;
        write!(
            f,
            "Size:           {} -> {} bytes ({:.2}x)",
            self.raw_bytes,
            self.archive_bytes,
            self.compression_ratio()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let report = ZipReport {
            total_lines: 12,
            loaded_lines: 8,
            failed_lines: 2,
            matched_lines: 6,
            unmatched_lines: 2,
            raw_bytes: 1000,
            archive_bytes: 250,
            ..Default::default()
        };
        assert!((report.load_rate() - 0.8).abs() < 1e-9);
        assert!((report.match_rate() - 0.75).abs() < 1e-9);
        assert!((report.compression_ratio() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_report() {
        let report = ZipReport::default();
        assert_eq!(report.load_rate(), 0.0);
        assert_eq!(report.match_rate(), 0.0);
        assert_eq!(report.compression_ratio(), 0.0);
    }

    #[test]
    fn test_timings_and_display() {
        let mut report = ZipReport::default();
        report.set_split_time(Duration::from_millis(1500));
        report.set_pack_time(Duration::from_millis(250));
        assert!((report.split_seconds - 1.5).abs() < 1e-9);
        let text = report.to_string();
        assert!(text.contains("split 1.500s, pack 0.250s"));
    }

    #[test]
    fn test_serializes() {
        let report = ZipReport {
            events: 3,
            ..Default::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["events"], 3);
    }
}
