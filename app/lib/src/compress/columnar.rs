//! Columnar encoding of parsed logs.
//!
//! Values are cut into alternating alphanumeric and delimiter segments and
//! transposed so that every segment position becomes its own column. Columns
//! of similar short tokens compress far better than the interleaved lines.
//!
//! Column naming:
//!
//! - `{field}_{k}`: segment `k` of a header field
//! - `EventId_0`: the event identifier of each row
//! - `{eid}_{slot}_{sub}`: segment `sub` of parameter `slot` of event `eid`

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::convert::{LogTable, CONTENT_FIELD};
use crate::error::{LogzipError, Result};
use crate::template::{has_wildcard, EventAssigner, MatchResult, NO_MATCH};

/// Name of the column holding event identifiers.
pub const EVENT_ID_COLUMN: &str = "EventId_0";

/// Whether a header field would produce column names that clash with the
/// event id column or the `{eid}_{slot}_{sub}` parameter columns.
pub fn is_reserved_field(name: &str) -> bool {
    if name == "EventId" {
        return true;
    }
    let Some(rest) = name.strip_prefix('E') else {
        return false;
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && rest[digits..].starts_with('_')
}

/// A named, ordered sequence of cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnFile {
    /// Column name, also the stem of its file in the archive.
    pub name: String,
    /// Cells in row order.
    pub cells: Vec<String>,
}

impl ColumnFile {
    /// Create a column.
    pub fn new(name: impl Into<String>, cells: Vec<String>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// File name inside the archive.
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name)
    }

    /// Cells joined by newlines, as written to disk.
    pub fn render(&self) -> String {
        self.cells.join("\n")
    }
}

/// Split a value into alternating alphanumeric and delimiter segments.
///
/// The first and last segments are always alphanumeric (possibly empty), so
/// the result has odd length and concatenates back to `value`.
///
/// ```
/// use logzip::compress::split_item;
///
/// assert_eq!(split_item("blk_-1608999687919862906"), vec!["blk", "_-", "1608999687919862906"]);
/// assert_eq!(split_item("/10.250.19.102:54106"), vec!["", "/", "10", ".", "250", ".", "19", ".", "102", ":", "54106"]);
/// assert_eq!(split_item(""), vec![""]);
/// ```
pub fn split_item(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_alnum = true;
    for (idx, ch) in value.char_indices() {
        let alnum = ch.is_ascii_alphanumeric();
        if alnum != in_alnum {
            parts.push(&value[start..idx]);
            start = idx;
            in_alnum = alnum;
        }
    }
    parts.push(&value[start..]);
    if !in_alnum {
        parts.push("");
    }
    parts
}

/// Turn ragged rows into columns, padding short rows with `""`.
pub fn transpose<S: AsRef<str>>(rows: &[Vec<S>]) -> Vec<Vec<String>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|k| {
            rows.iter()
                .map(|row| row.get(k).map_or_else(String::new, |s| s.as_ref().to_string()))
                .collect()
        })
        .collect()
}

/// Rebuild values from their segment columns, given in position order.
pub fn join_columns(columns: &[&ColumnFile]) -> Vec<String> {
    let rows = columns.iter().map(|c| c.cells.len()).max().unwrap_or(0);
    (0..rows)
        .map(|r| {
            columns
                .iter()
                .filter_map(|c| c.cells.get(r).map(String::as_str))
                .collect::<String>()
        })
        .collect()
}

/// Split every value and emit one column per segment position.
pub fn split_columns<S: AsRef<str>>(prefix: &str, values: &[S]) -> Vec<ColumnFile> {
    let rows: Vec<Vec<&str>> = values.iter().map(|v| split_item(v.as_ref())).collect();
    transpose(&rows)
        .into_iter()
        .enumerate()
        .map(|(k, cells)| ColumnFile::new(format!("{}_{}", prefix, k), cells))
        .collect()
}

/// Columns of the given prefix sorted by position.
pub fn columns_with_prefix<'a>(columns: &'a [ColumnFile], prefix: &str) -> Vec<&'a ColumnFile> {
    let mut found: Vec<(usize, &ColumnFile)> = columns
        .iter()
        .filter_map(|c| {
            let rest = c.name.strip_prefix(prefix)?.strip_prefix('_')?;
            rest.parse::<usize>().ok().map(|k| (k, c))
        })
        .collect();
    found.sort_by_key(|(k, _)| *k);
    found.into_iter().map(|(_, c)| c).collect()
}

/// Level 1: one raw column per header field.
pub fn encode_raw(table: &LogTable) -> Vec<ColumnFile> {
    table
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let cells = table.records().iter().map(|r| r.fields[idx].clone()).collect();
            ColumnFile::new(format!("{}_0", header), cells)
        })
        .collect()
}

/// Parameter tuples of one event, in row order.
#[derive(Debug, Clone, Default)]
struct ParameterGroup {
    event_id: String,
    rows: Vec<Vec<String>>,
}

/// Output of the structured encoding (levels 2 and 3).
#[derive(Debug, Clone, Default)]
pub struct StructuredColumns {
    /// Header field columns and the event id column.
    pub field_columns: Vec<ColumnFile>,
    /// `{eid}_{slot}_{sub}` columns, eligible for dictionary coding.
    pub parameter_columns: Vec<ColumnFile>,
    /// `id → template`, including `NoMatch` when present.
    pub templates: BTreeMap<String, String>,
    /// Rows whose content matched a template.
    pub matched: usize,
    /// Rows whose content matched nothing.
    pub unmatched: usize,
}

impl StructuredColumns {
    /// Number of events seen.
    pub fn event_count(&self) -> usize {
        self.templates.len()
    }
}

/// Levels 2 and 3: split header fields, assign event ids and pack parameters.
///
/// `memo` must hold a result for every distinct content of the table.
pub fn encode_structured(
    table: &LogTable,
    memo: &HashMap<String, MatchResult>,
) -> Result<StructuredColumns> {
    let content_idx = table
        .column_index(CONTENT_FIELD)
        .ok_or_else(|| LogzipError::MissingContentField {
            format: table
                .headers()
                .iter()
                .map(|h| format!("<{}>", h))
                .collect::<Vec<_>>()
                .join(" "),
            level: 2,
        })?;

    let mut field_columns = Vec::new();
    for (idx, header) in table.headers().iter().enumerate() {
        if idx == content_idx {
            continue;
        }
        let values: Vec<&str> = table.records().iter().map(|r| r.fields[idx].as_str()).collect();
        field_columns.extend(split_columns(header, &values));
    }

    let no_match = MatchResult::no_match();
    let mut assigner = EventAssigner::new();
    let mut event_ids = Vec::with_capacity(table.len());
    let mut groups: Vec<ParameterGroup> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut matched = 0;

    for record in table.records() {
        let content = record.fields[content_idx].as_str();
        let result = memo.get(content).unwrap_or(&no_match);
        let template = result.template_str();
        let event_id = assigner.assign(template).to_string();

        let parameters = if result.is_match() {
            matched += 1;
            has_wildcard(template).then(|| result.parameters.clone())
        } else {
            Some(vec![content.to_string()])
        };

        if let Some(parameters) = parameters {
            let slot = *group_index.entry(event_id.clone()).or_insert_with(|| {
                groups.push(ParameterGroup {
                    event_id: event_id.clone(),
                    rows: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].rows.push(parameters);
        }
        event_ids.push(event_id);
    }
    field_columns.push(ColumnFile::new(EVENT_ID_COLUMN, event_ids));

    let mut parameter_columns = Vec::new();
    for group in &groups {
        for (slot, values) in transpose(&group.rows).into_iter().enumerate() {
            parameter_columns.extend(split_columns(&format!("{}_{}", group.event_id, slot), &values));
        }
    }

    let unmatched = table.len() - matched;
    log::debug!(
        "{} event(s), {} parameter group(s), {} unmatched row(s)",
        assigner.len(),
        groups.len(),
        unmatched
    );
    if let Some(id) = assigner.get(NO_MATCH) {
        log::debug!("Unmatched content stored under {}", id);
    }

    Ok(StructuredColumns {
        field_columns,
        parameter_columns,
        templates: assigner.mapping(),
        matched,
        unmatched,
    })
}
