//! Template compilation and matching.
//!
//! This module contains the tokenizer, the match tree built from the
//! template list, the backtracking matcher and the event identifier
//! assigner.

mod events;
mod matcher;
mod tokenizer;
mod tree;

use std::path::Path;

pub use events::EventAssigner;
pub use matcher::{MatchResult, TemplateMatcher, NO_MATCH};
pub use tokenizer::{
    has_wildcard, preprocess_template, tokenize, wildcard_count, MAX_WILDCARDS, NUM_PLACEHOLDER,
    WILDCARD,
};
pub use tree::{LeafRecord, MatchTree, Node, NodeId};

use crate::error::Result;

/// A template from the template list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Positional identifier, `E0`, `E1`, ..., used when reporting skipped
    /// templates. Unrelated to the event ids of a run.
    pub id: String,
    /// Template text with `<*>` wildcards.
    pub pattern: String,
}

/// Build templates from lines, skipping blank ones.
pub fn templates_from_lines<I, S>(lines: I) -> Vec<Template>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            let pattern = line.as_ref().trim();
            (!pattern.is_empty()).then(|| pattern.to_string())
        })
        .enumerate()
        .map(|(idx, pattern)| Template {
            id: format!("E{}", idx),
            pattern,
        })
        .collect()
}

/// Read a template file, one template per line.
pub fn read_templates(path: &Path) -> Result<Vec<Template>> {
    let text = std::fs::read_to_string(path)?;
    let templates = templates_from_lines(text.lines());
    log::info!("Read {} templates from {}", templates.len(), path.display());
    Ok(templates)
}
