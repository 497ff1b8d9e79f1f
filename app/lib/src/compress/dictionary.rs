//! Dictionary coding of parameter columns.
//!
//! Every distinct parameter segment gets a short code: its 1-based index of
//! first appearance written in base 64. Cells are replaced by their codes and
//! the `code → value` map is persisted as `parameter_mapping.json`.
//!
//! One dictionary spans all parameter columns of a run, so a value that
//! appears in several columns shares a single code.

use std::collections::{BTreeMap, HashMap};

use super::columnar::ColumnFile;
use crate::error::{LogzipError, Result};

/// Digits of the base-64 code alphabet, least significant first in value.
pub const CODE_ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz+=";

/// Write `index` in base 64 with [`CODE_ALPHABET`].
///
/// ```
/// use logzip::compress::encode_index;
///
/// assert_eq!(encode_index(1), "1");
/// assert_eq!(encode_index(63), "=");
/// assert_eq!(encode_index(64), "10");
/// ```
pub fn encode_index(mut index: usize) -> String {
    if index == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while index > 0 {
        digits.push(CODE_ALPHABET[index % 64]);
        index /= 64;
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

/// Assigns codes to values and rewrites columns with them.
#[derive(Debug, Default, Clone)]
pub struct DictionaryCoder {
    codes: HashMap<String, String>,
    values: Vec<String>,
}

impl DictionaryCoder {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Code of `value`, allocating the next index on first sight.
    pub fn code_for(&mut self, value: &str) -> &str {
        if !self.codes.contains_key(value) {
            self.values.push(value.to_string());
            let code = encode_index(self.values.len());
            self.codes.insert(value.to_string(), code);
        }
        &self.codes[value]
    }

    /// Replace every cell of `columns` by its code.
    pub fn encode_columns(&mut self, columns: &mut [ColumnFile]) {
        for column in columns.iter_mut() {
            for cell in column.cells.iter_mut() {
                *cell = self.code_for(cell).to_string();
            }
        }
        log::debug!(
            "Dictionary holds {} value(s) over {} column(s)",
            self.values.len(),
            columns.len()
        );
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value was coded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The `code → value` map persisted with the archive.
    pub fn reverse_mapping(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .enumerate()
            .map(|(idx, value)| (encode_index(idx + 1), value.clone()))
            .collect()
    }
}

/// Substitute codes back into values.
pub fn decode_column(cells: &[String], mapping: &BTreeMap<String, String>) -> Result<Vec<String>> {
    cells
        .iter()
        .map(|code| {
            mapping
                .get(code)
                .cloned()
                .ok_or_else(|| LogzipError::UnknownDictionaryCode {
                    code: code.clone(),
                    size: mapping.len(),
                })
        })
        .collect()
}
