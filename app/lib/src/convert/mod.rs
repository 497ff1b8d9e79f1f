//! Turning raw log text into structured records.
//!
//! [`LogFormat`] compiles a `<Field>` format string into a field-splitting
//! regex and [`LogLoader`] applies it to every line, in parallel when asked.

mod format;
mod loader;

pub use format::{build_regex, LogFormat, CONTENT_FIELD};
pub use loader::{LoadOutcome, LogLoader, LogRecord, LogTable};
