//! Prefix tree compiled from the template list.
//!
//! Templates with a wildcard are tokenized and inserted as paths of an
//! arena-allocated trie. Every node has a branch part (token → child) and a
//! leaf part (templates ending at this node). Templates without a wildcard go
//! to a separate exact-match table and are only ever matched verbatim.
//!
//! The tree is built once and never mutated afterwards; it is `Send + Sync`
//! and shared by reference across matcher workers.

use std::collections::{HashMap, HashSet};

use super::matcher::NO_MATCH;
use super::tokenizer::{has_wildcard, preprocess_template, tokenize, WILDCARD};
use super::Template;
use crate::error::{LogzipError, Result};

/// Index of a node inside [`MatchTree`].
pub type NodeId = usize;

/// A template ending at a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafRecord {
    /// The template as written in the template list.
    pub template: String,
    /// Number of tokens of the compiled template.
    pub length: usize,
    /// Number of wildcard tokens of the compiled template.
    pub wildcards: usize,
    /// Concatenated compiled tokens; identical keys share one leaf.
    key: String,
}

/// One trie node.
#[derive(Debug, Default, Clone)]
pub struct Node {
    children: HashMap<String, NodeId>,
    leaves: Vec<LeafRecord>,
}

impl Node {
    /// Child reached through the edge labelled `token`.
    pub fn child(&self, token: &str) -> Option<NodeId> {
        self.children.get(token).copied()
    }

    /// Whether `token` leads to further structure below this node.
    ///
    /// Only these tokens are tried as the end of a wildcard span.
    pub fn continues_with(&self, token: &str) -> bool {
        self.children.contains_key(token)
    }

    /// Templates ending at this node, in insertion order.
    pub fn leaves(&self) -> &[LeafRecord] {
        &self.leaves
    }
}

/// Compiled template set: trie plus exact-match table.
#[derive(Debug, Clone)]
pub struct MatchTree {
    nodes: Vec<Node>,
    exact: HashSet<String>,
    template_count: usize,
}

impl MatchTree {
    /// Id of the root node.
    pub const ROOT: NodeId = 0;

    /// Compile `templates` into a tree.
    ///
    /// Malformed templates (nothing left after tokenization, or only a
    /// wildcard) are skipped silently. A template spelled like the
    /// [`NO_MATCH`] marker is skipped with a warning, since its event could
    /// not be told apart from unmatched rows. An empty list is rejected.
    pub fn build(templates: &[Template]) -> Result<Self> {
        if templates.is_empty() {
            return Err(LogzipError::EmptyTemplates);
        }

        let mut tree = Self {
            nodes: vec![Node::default()],
            exact: HashSet::new(),
            template_count: templates.len(),
        };

        for template in templates {
            if template.pattern == NO_MATCH {
                log::warn!("Skipping template {}: '{}' is reserved", template.id, NO_MATCH);
                continue;
            }
            tree.insert(&template.pattern);
        }

        log::debug!(
            "Built match tree: {} templates, {} nodes, {} exact",
            tree.template_count,
            tree.nodes.len(),
            tree.exact.len()
        );
        Ok(tree)
    }

    fn insert(&mut self, pattern: &str) {
        if !has_wildcard(pattern) {
            self.exact.insert(pattern.to_string());
            return;
        }

        let compiled = preprocess_template(pattern);
        let tokens = tokenize(&compiled);
        if tokens.is_empty() || tokens == [WILDCARD] {
            return;
        }

        let mut node = Self::ROOT;
        for token in &tokens {
            node = match self.nodes[node].child(token) {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].children.insert((*token).to_string(), child);
                    child
                }
            };
        }

        let key = tokens.concat();
        let leaves = &mut self.nodes[node].leaves;
        if leaves.iter().all(|leaf| leaf.key != key) {
            leaves.push(LeafRecord {
                template: pattern.to_string(),
                length: tokens.len(),
                wildcards: tokens.iter().filter(|t| **t == WILDCARD).count(),
                key,
            });
        }
    }

    /// Whether `content` equals a wildcard-free template.
    pub fn is_exact(&self, content: &str) -> bool {
        self.exact.contains(content)
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Number of trie nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of templates the tree was built from.
    pub fn template_count(&self) -> usize {
        self.template_count
    }

    /// Number of wildcard-free templates.
    pub fn exact_count(&self) -> usize {
        self.exact.len()
    }

    /// Total number of leaf records in the trie.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().map(|n| n.leaves.len()).sum()
    }
}
