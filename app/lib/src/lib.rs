//! # logzip
//!
//! Template-driven log compression.
//!
//! Log lines are split into header fields with a `<Field>` format string.
//! The free-text `Content` field is matched against a list of message
//! templates (`Deleting block <*> file <*>`), each line is replaced by an
//! event identifier plus the values bound to the wildcards, and the result
//! is stored column by column inside a compressed tar archive.
//!
//! ## Levels
//!
//! - **1**: header fields are stored as raw columns, no template matching
//! - **2**: header fields and parameters are split into sub-token columns
//! - **3**: as level 2, and parameter segments are dictionary coded
//!
//! ## Quick Start
//!
//! ```rust
//! use logzip::{templates_from_lines, CompressionLevel, Kernel, LogZipper, ZipConfig};
//!
//! let out = tempfile::tempdir()?;
//! let config = ZipConfig::new("<Level> <Component>: <Content>")
//!     .with_out_dir(out.path())
//!     .with_out_name("app.log.logzip")
//!     .with_level(CompressionLevel::Indexed)
//!     .with_kernel(Kernel::Gz);
//!
//! let templates = templates_from_lines(["Deleting block <*>", "Served block <*> to <*>"]);
//! let log = "INFO dfs: Deleting block blk_1\nINFO dfs: Served block blk_1 to /10.0.0.7\n";
//!
//! let report = LogZipper::new(config)?.zip_text(log, &templates)?;
//! assert_eq!(report.matched_lines, 2);
//! assert!(report.archive.exists());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Parallelism
//!
//! Line extraction and template matching run on a fixed-size worker pool
//! (see [`pool`]). The number of workers never changes the output.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compress;
pub mod config;
pub mod convert;
pub mod error;
pub mod pool;
pub mod template;

pub use compress::{
    decode_column, join_columns, read_archive, split_item, ArchiveEntry, ColumnFile,
    DictionaryCoder, LogZipper, ZipReport,
};
pub use config::{CompressionLevel, Kernel, ZipConfig};
pub use convert::{LoadOutcome, LogFormat, LogLoader, LogRecord, LogTable};
pub use error::{LogzipError, Result};
pub use template::{
    read_templates, templates_from_lines, tokenize, EventAssigner, MatchResult, MatchTree,
    Template, TemplateMatcher, NO_MATCH, WILDCARD,
};
