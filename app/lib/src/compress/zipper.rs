//! End-to-end compression of one log file.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use super::archive::Staging;
use super::columnar::{encode_raw, encode_structured, is_reserved_field, ColumnFile};
use super::dictionary::DictionaryCoder;
use super::stats::ZipReport;
use crate::config::{CompressionLevel, ZipConfig};
use crate::convert::{LoadOutcome, LogFormat, LogLoader};
use crate::error::{LogzipError, Result};
use crate::template::{read_templates, MatchTree, Template, TemplateMatcher};

/// Archive entry holding `id → template`.
pub const TEMPLATE_MAPPING_FILE: &str = "template_mapping.json";
/// Archive entry holding `code → parameter value`.
pub const PARAMETER_MAPPING_FILE: &str = "parameter_mapping.json";
/// Archive entry holding rejected lines.
pub const FAILED_LOGS_FILE: &str = "failed_logs.json";

/// Everything the encoder produced, ready to be staged.
#[derive(Debug, Default)]
struct Encoded {
    columns: Vec<ColumnFile>,
    templates: Option<BTreeMap<String, String>>,
    parameters: Option<BTreeMap<String, String>>,
    distinct_contents: usize,
    matched: usize,
    unmatched: usize,
    dictionary_size: usize,
}

/// Compresses log files according to a [`ZipConfig`].
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use logzip::{CompressionLevel, LogZipper, ZipConfig};
///
/// let config = ZipConfig::new("<Date> <Time> <Pid> <Level> <Component>: <Content>")
///     .with_out_dir("zip_out")
///     .with_out_name("HDFS_2k.log.logzip")
///     .with_level(CompressionLevel::Indexed)
///     .with_workers(4);
/// let zipper = LogZipper::new(config)?;
/// let report = zipper.zip_file(Path::new("HDFS_2k.log"), Some(Path::new("HDFS_templates.txt")))?;
/// println!("{}", report);
/// # Ok::<(), logzip::LogzipError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LogZipper {
    config: ZipConfig,
    format: LogFormat,
}

impl LogZipper {
    /// Validate the configuration and compile the log format.
    pub fn new(config: ZipConfig) -> Result<Self> {
        config.validate()?;
        let format = LogFormat::parse(&config.log_format)?;
        if config.level.is_structured() && format.content_index().is_none() {
            return Err(LogzipError::MissingContentField {
                format: format.as_str().to_string(),
                level: config.level.as_u8(),
            });
        }
        if config.level.is_structured() {
            if let Some(field) = format.headers().iter().find(|h| is_reserved_field(h)) {
                return Err(LogzipError::InvalidLogFormat {
                    format: format.as_str().to_string(),
                    message: format!("field <{}> clashes with generated column names", field),
                });
            }
        }
        Ok(Self { config, format })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ZipConfig {
        &self.config
    }

    /// The compiled log format.
    pub fn format(&self) -> &LogFormat {
        &self.format
    }

    /// Compress `log_path`, matching against the templates in `templates_path`.
    ///
    /// Templates are only read at levels 2 and 3.
    pub fn zip_file(&self, log_path: &Path, templates_path: Option<&Path>) -> Result<ZipReport> {
        let templates = match (self.config.level.is_structured(), templates_path) {
            (true, Some(path)) => read_templates(path)?,
            (true, None) => return Err(LogzipError::EmptyTemplates),
            (false, _) => Vec::new(),
        };
        let start = Instant::now();
        let tree = self.build_tree(&templates)?;
        let raw_bytes = std::fs::metadata(log_path)?.len();
        let outcome = self.loader().load_file(log_path)?;
        self.finish(outcome, tree.as_ref(), raw_bytes, start)
    }

    /// Compress log text held in memory.
    pub fn zip_text(&self, text: &str, templates: &[Template]) -> Result<ZipReport> {
        let start = Instant::now();
        let tree = self.build_tree(templates)?;
        let outcome = self.loader().load_text(text)?;
        self.finish(outcome, tree.as_ref(), text.len() as u64, start)
    }

    fn loader(&self) -> LogLoader {
        LogLoader::new(self.format.clone(), self.config.loader_workers)
    }

    fn build_tree(&self, templates: &[Template]) -> Result<Option<MatchTree>> {
        if !self.config.level.is_structured() {
            return Ok(None);
        }
        MatchTree::build(templates).map(Some)
    }

    fn finish(
        &self,
        outcome: LoadOutcome,
        tree: Option<&MatchTree>,
        raw_bytes: u64,
        start: Instant,
    ) -> Result<ZipReport> {
        let encoded = self.encode(&outcome, tree)?;

        let mut report = ZipReport {
            total_lines: outcome.total_lines,
            loaded_lines: outcome.table.len(),
            failed_lines: outcome.failed.len(),
            matched_lines: encoded.matched,
            unmatched_lines: encoded.unmatched,
            distinct_contents: encoded.distinct_contents,
            events: encoded.templates.as_ref().map_or(0, |t| t.len()),
            column_files: encoded.columns.len(),
            dictionary_size: encoded.dictionary_size,
            raw_bytes,
            archive: self.config.archive_path(),
            ..Default::default()
        };
        report.set_split_time(start.elapsed());

        let pack_start = Instant::now();
        report.archive_bytes = self.pack(&encoded, &outcome)?;
        report.set_pack_time(pack_start.elapsed());

        report.log();
        Ok(report)
    }

    fn encode(&self, outcome: &LoadOutcome, tree: Option<&MatchTree>) -> Result<Encoded> {
        let table = &outcome.table;
        let Some(tree) = tree else {
            return Ok(Encoded {
                columns: encode_raw(table),
                ..Default::default()
            });
        };

        let contents = table.content().unwrap_or_default();
        let memo = TemplateMatcher::new(tree).match_all(&contents, self.config.match_workers)?;
        let structured = encode_structured(table, &memo)?;

        let mut encoded = Encoded {
            templates: Some(structured.templates),
            distinct_contents: memo.len(),
            matched: structured.matched,
            unmatched: structured.unmatched,
            ..Default::default()
        };

        if !self.config.lossy {
            let mut parameter_columns = structured.parameter_columns;
            if self.config.level == CompressionLevel::Indexed {
                let mut coder = DictionaryCoder::new();
                coder.encode_columns(&mut parameter_columns);
                encoded.dictionary_size = coder.len();
                encoded.parameters = Some(coder.reverse_mapping());
            }
            encoded.columns = parameter_columns;
        } else {
            log::info!(
                "Lossy mode: dropping {} parameter column(s)",
                structured.parameter_columns.len()
            );
        }
        encoded.columns.extend(structured.field_columns);
        Ok(encoded)
    }

    fn pack(&self, encoded: &Encoded, outcome: &LoadOutcome) -> Result<u64> {
        let mut staging = Staging::new(self.config.tmp_dir.as_deref(), &self.config.out_dir)?;
        log::debug!("Staging output in {}", staging.path().display());

        for column in &encoded.columns {
            staging.write_column(column)?;
        }
        if let Some(templates) = &encoded.templates {
            staging.write_json(TEMPLATE_MAPPING_FILE, templates)?;
        }
        if let Some(parameters) = &encoded.parameters {
            staging.write_json(PARAMETER_MAPPING_FILE, parameters)?;
        }
        staging.write_json(FAILED_LOGS_FILE, &outcome.failed)?;

        staging.pack(self.config.kernel, &self.config.archive_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::archive::read_archive;
    use crate::template::templates_from_lines;

    const FORMAT: &str = "<Level> <Component>: <Content>";
    const LOG: &str = "INFO dfs: Deleting block blk_1 file /a\n\
                       WARN dfs: Deleting block blk_2 file /b\n\
                       not a log line\n\
                       INFO net: peer gone\n";

    fn zipper(dir: &Path, level: CompressionLevel, lossy: bool) -> LogZipper {
        LogZipper::new(
            ZipConfig::new(FORMAT)
                .with_out_dir(dir)
                .with_out_name("unit")
                .with_level(level)
                .with_lossy(lossy),
        )
        .unwrap()
    }

    fn entry_names(path: &Path) -> Vec<String> {
        read_archive(path).unwrap().into_iter().map(|e| e.name).collect()
    }

    #[test]
    fn test_new_rejects_missing_content() {
        let result = LogZipper::new(ZipConfig::new("<Level> <Message>"));
        assert!(matches!(result, Err(LogzipError::MissingContentField { level: 3, .. })));

        let raw = ZipConfig::new("<Level> <Message>").with_level(CompressionLevel::Raw);
        assert!(LogZipper::new(raw).is_ok());
    }

    #[test]
    fn test_new_rejects_reserved_fields() {
        for format in ["<EventId> <Content>", "<E1_0> <Content>"] {
            let result = LogZipper::new(ZipConfig::new(format));
            assert!(
                matches!(result, Err(LogzipError::InvalidLogFormat { ref message, .. }) if message.contains("clashes")),
                "{}",
                format
            );
        }

        let raw = ZipConfig::new("<EventId> <Content>").with_level(CompressionLevel::Raw);
        assert!(LogZipper::new(raw).is_ok());
        assert!(LogZipper::new(ZipConfig::new("<E1> <Content>")).is_ok());
    }

    #[test]
    fn test_new_rejects_empty_format() {
        assert!(matches!(
            LogZipper::new(ZipConfig::default()),
            Err(LogzipError::MissingLogFormat)
        ));
    }

    #[test]
    fn test_structured_requires_templates() {
        let dir = tempfile::tempdir().unwrap();
        let zipper = zipper(dir.path(), CompressionLevel::Parsed, false);
        assert!(matches!(zipper.zip_text(LOG, &[]), Err(LogzipError::EmptyTemplates)));
        let log = dir.path().join("a.log");
        std::fs::write(&log, LOG).unwrap();
        assert!(matches!(zipper.zip_file(&log, None), Err(LogzipError::EmptyTemplates)));
    }

    #[test]
    fn test_level_one() {
        let dir = tempfile::tempdir().unwrap();
        let report = zipper(dir.path(), CompressionLevel::Raw, false)
            .zip_text(LOG, &[])
            .unwrap();
        assert_eq!(report.loaded_lines, 3);
        assert_eq!(report.failed_lines, 1);
        assert_eq!(report.events, 0);
        assert_eq!(
            entry_names(&report.archive),
            vec!["Level_0.csv", "Component_0.csv", "Content_0.csv", "failed_logs.json"]
        );
    }

    #[test]
    fn test_level_three() {
        let dir = tempfile::tempdir().unwrap();
        let templates = templates_from_lines(["Deleting block <*> file <*>"]);
        let report = zipper(dir.path(), CompressionLevel::Indexed, false)
            .zip_text(LOG, &templates)
            .unwrap();
        assert_eq!(report.matched_lines, 2);
        assert_eq!(report.unmatched_lines, 1);
        assert_eq!(report.events, 2);
        assert!(report.dictionary_size > 0);

        let names = entry_names(&report.archive);
        assert!(names.contains(&"E1_0_0.csv".to_string()));
        assert!(names.contains(&"EventId_0.csv".to_string()));
        assert!(names.contains(&PARAMETER_MAPPING_FILE.to_string()));
        assert!(names.contains(&TEMPLATE_MAPPING_FILE.to_string()));
        assert!(!names.iter().any(|n| n.starts_with("Content")));
    }

    #[test]
    fn test_lossy_drops_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let templates = templates_from_lines(["Deleting block <*> file <*>"]);
        let report = zipper(dir.path(), CompressionLevel::Indexed, true)
            .zip_text(LOG, &templates)
            .unwrap();
        let names = entry_names(&report.archive);
        assert!(!names.iter().any(|n| n.starts_with("E1_")));
        assert!(!names.contains(&PARAMETER_MAPPING_FILE.to_string()));
        assert!(names.contains(&TEMPLATE_MAPPING_FILE.to_string()));
        assert_eq!(report.dictionary_size, 0);
    }
}
