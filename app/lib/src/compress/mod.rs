//! Columnar encoding, dictionary coding and archiving.
//!
//! [`LogZipper`] drives a run: it loads the log, matches contents against the
//! templates, encodes the result into column files, optionally dictionary
//! codes the parameter columns and bundles everything into one archive.

mod archive;
mod columnar;
mod dictionary;
mod stats;
mod zipper;

pub use archive::{read_archive, write_archive, ArchiveEntry, Staging};
pub use columnar::{
    columns_with_prefix, encode_raw, encode_structured, is_reserved_field, join_columns,
    split_columns, split_item, transpose, ColumnFile, StructuredColumns, EVENT_ID_COLUMN,
};
pub use dictionary::{decode_column, encode_index, DictionaryCoder, CODE_ALPHABET};
pub use stats::ZipReport;
pub use zipper::{LogZipper, FAILED_LOGS_FILE, PARAMETER_MAPPING_FILE, TEMPLATE_MAPPING_FILE};
