//! Configuration types for the logzip library.
//!
//! [`ZipConfig`] carries every option of a run: the log format, output
//! locations, the compression level, the lossy switch, the archive kernel and
//! the worker counts of both parallel phases. It can be built in code with the
//! `with_*` setters or loaded from a JSON file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LogzipError, Result};

/// How much structure is extracted before archiving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CompressionLevel {
    /// Level 1: one column per header field, no structural parsing.
    Raw,
    /// Level 2: field splitting and template-guided parameter columns.
    Parsed,
    /// Level 3: level 2 plus dictionary coding of the parameter columns.
    Indexed,
}

impl CompressionLevel {
    /// Numeric level as used on the command line.
    pub fn as_u8(self) -> u8 {
        match self {
            CompressionLevel::Raw => 1,
            CompressionLevel::Parsed => 2,
            CompressionLevel::Indexed => 3,
        }
    }

    /// Whether this level runs the template matcher.
    pub fn is_structured(self) -> bool {
        self != CompressionLevel::Raw
    }
}

impl TryFrom<u8> for CompressionLevel {
    type Error = LogzipError;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            1 => Ok(CompressionLevel::Raw),
            2 => Ok(CompressionLevel::Parsed),
            3 => Ok(CompressionLevel::Indexed),
            _ => Err(LogzipError::UnsupportedLevel { level }),
        }
    }
}

impl From<CompressionLevel> for u8 {
    fn from(level: CompressionLevel) -> u8 {
        level.as_u8()
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Generic codec applied to the final tar bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    /// gzip via `flate2`
    #[serde(alias = "gzip")]
    Gz,
    /// bzip2 via `bzip2`
    #[serde(alias = "bzip2")]
    Bz2,
    /// LZMA via `lzma-rs`
    #[serde(alias = "xz")]
    Lzma,
    /// zstd via `zstd`
    #[serde(alias = "zstd")]
    Zst,
}

impl Kernel {
    /// File extension appended after `.tar.`.
    pub fn extension(self) -> &'static str {
        match self {
            Kernel::Gz => "gz",
            Kernel::Bz2 => "bz2",
            Kernel::Lzma => "lzma",
            Kernel::Zst => "zst",
        }
    }

    /// Guess the kernel from an archive file name.
    pub fn from_path(path: &Path) -> Option<Kernel> {
        let name = path.file_name()?.to_str()?;
        [Kernel::Gz, Kernel::Bz2, Kernel::Lzma, Kernel::Zst]
            .into_iter()
            .find(|kernel| name.ends_with(&format!(".tar.{}", kernel.extension())))
    }
}

impl FromStr for Kernel {
    type Err = LogzipError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gz" | "gzip" => Ok(Kernel::Gz),
            "bz2" | "bzip2" => Ok(Kernel::Bz2),
            "lzma" | "xz" => Ok(Kernel::Lzma),
            "zst" | "zstd" => Ok(Kernel::Zst),
            _ => Err(LogzipError::UnsupportedKernel(s.to_string())),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Configuration of one compression run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZipConfig {
    /// Log line format, e.g. `<Date> <Time> <Level> <Component>: <Content>`.
    ///
    /// Each `<Name>` declares a header field; the text between them is the
    /// literal separator. Required.
    pub log_format: String,

    /// Directory receiving the final archive.
    ///
    /// Default: `.`
    pub out_dir: PathBuf,

    /// Base name of the archive; the kernel extension is appended.
    ///
    /// Default: `logzip`
    pub out_name: String,

    /// Working directory for the column files.
    ///
    /// When `None`, a fresh temporary directory is created inside `out_dir`
    /// and removed after archiving.
    pub tmp_dir: Option<PathBuf>,

    /// Compression level.
    ///
    /// Default: [`CompressionLevel::Indexed`]
    pub level: CompressionLevel,

    /// Drop the parameter columns instead of indexing them.
    ///
    /// Default: false
    pub lossy: bool,

    /// Codec of the final archive.
    ///
    /// Default: [`Kernel::Gz`]
    pub kernel: Kernel,

    /// Number of workers extracting header fields.
    ///
    /// - 0: rayon default (one per core)
    /// - 1: run inline on the calling thread
    /// - N: a pool of N threads
    ///
    /// Default: 1
    pub loader_workers: usize,

    /// Number of workers matching distinct contents against the templates.
    ///
    /// Same convention as `loader_workers`. Default: 1
    pub match_workers: usize,
}

impl Default for ZipConfig {
    fn default() -> Self {
        Self {
            log_format: String::new(),
            out_dir: PathBuf::from("."),
            out_name: "logzip".to_string(),
            tmp_dir: None,
            level: CompressionLevel::Indexed,
            lossy: false,
            kernel: Kernel::Gz,
            loader_workers: 1,
            match_workers: 1,
        }
    }
}

impl ZipConfig {
    /// Create a configuration for the given log format with default values.
    pub fn new(log_format: impl Into<String>) -> Self {
        Self {
            log_format: log_format.into(),
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file. Missing keys take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Set the log format.
    pub fn with_log_format(mut self, log_format: impl Into<String>) -> Self {
        self.log_format = log_format.into();
        self
    }

    /// Set the output directory.
    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    /// Set the archive base name.
    pub fn with_out_name(mut self, out_name: impl Into<String>) -> Self {
        self.out_name = out_name.into();
        self
    }

    /// Set the working directory.
    pub fn with_tmp_dir(mut self, tmp_dir: impl Into<PathBuf>) -> Self {
        self.tmp_dir = Some(tmp_dir.into());
        self
    }

    /// Set the compression level.
    pub fn with_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    /// Enable or disable lossy mode.
    pub fn with_lossy(mut self, lossy: bool) -> Self {
        self.lossy = lossy;
        self
    }

    /// Set the archive kernel.
    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Set the worker count of both parallel phases.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.loader_workers = workers;
        self.match_workers = workers;
        self
    }

    /// Set the loader worker count.
    pub fn with_loader_workers(mut self, workers: usize) -> Self {
        self.loader_workers = workers;
        self
    }

    /// Set the matcher worker count.
    pub fn with_match_workers(mut self, workers: usize) -> Self {
        self.match_workers = workers;
        self
    }

    /// Path of the archive this configuration produces.
    pub fn archive_path(&self) -> PathBuf {
        self.out_dir
            .join(format!("{}.tar.{}", self.out_name, self.kernel.extension()))
    }

    /// Reject configurations that cannot run.
    ///
    /// Only checks what is knowable without parsing the format; the format
    /// itself is validated by [`crate::LogFormat::parse`].
    pub fn validate(&self) -> Result<()> {
        if self.log_format.trim().is_empty() {
            return Err(LogzipError::MissingLogFormat);
        }
        Ok(())
    }
}
