//! Event identifier assignment.

use std::collections::{BTreeMap, HashMap};

/// Assigns `E1, E2, ...` to template strings in order of first sight.
///
/// Identifiers depend only on the order in which templates are observed, so
/// an assigner must be created per batch and never reused across batches.
#[derive(Debug, Default, Clone)]
pub struct EventAssigner {
    ids: HashMap<String, String>,
    order: Vec<String>,
}

impl EventAssigner {
    /// Create an empty assigner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier of `template`, allocating the next one on first sight.
    pub fn assign(&mut self, template: &str) -> &str {
        if !self.ids.contains_key(template) {
            let id = format!("E{}", self.order.len() + 1);
            self.ids.insert(template.to_string(), id);
            self.order.push(template.to_string());
        }
        &self.ids[template]
    }

    /// Identifier of an already observed template.
    pub fn get(&self, template: &str) -> Option<&str> {
        self.ids.get(template).map(String::as_str)
    }

    /// Number of distinct templates seen.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no template has been seen.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(id, template)` pairs in assignment order.
    pub fn events(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.order
            .iter()
            .map(move |template| (self.ids[template].as_str(), template.as_str()))
    }

    /// The `id → template` table persisted next to the columns.
    pub fn mapping(&self) -> BTreeMap<String, String> {
        self.events()
            .map(|(id, template)| (id.to_string(), template.to_string()))
            .collect()
    }
}
