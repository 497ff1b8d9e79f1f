//! Backtracking template matcher.
//!
//! A content string is first looked up in the exact-match table. Otherwise
//! it is tokenized and walked down the [`MatchTree`]:
//!
//! - literal edges consume one token
//! - a wildcard edge consumes a span of tokens, ending only right before a
//!   token that continues the structure below the wildcard, or at the end of
//!   the input
//!
//! Every template reached with all tokens consumed is a candidate. The
//! longest template wins; ties go to the one with fewer wildcards.

use std::cmp::Reverse;
use std::collections::HashMap;

use super::tokenizer::{tokenize, WILDCARD};
use super::tree::{LeafRecord, MatchTree, NodeId};
use crate::error::Result;
use crate::pool;

/// Template string recorded for contents no template matches.
pub const NO_MATCH: &str = "NoMatch";

/// Outcome of matching one content string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Winning template, `None` when nothing matched.
    pub template: Option<String>,
    /// One value per wildcard slot, in template order.
    pub parameters: Vec<String>,
}

impl MatchResult {
    /// The "no match" outcome.
    pub fn no_match() -> Self {
        Self {
            template: None,
            parameters: Vec::new(),
        }
    }

    /// Whether a template was found.
    pub fn is_match(&self) -> bool {
        self.template.is_some()
    }

    /// Template string for event assignment; [`NO_MATCH`] for misses.
    pub fn template_str(&self) -> &str {
        self.template.as_deref().unwrap_or(NO_MATCH)
    }
}

struct Candidate<'t> {
    leaf: &'t LeafRecord,
    parameters: Vec<String>,
}

/// Matches content strings against a compiled [`MatchTree`].
///
/// The matcher only borrows the tree, so one tree can back any number of
/// matchers on any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct TemplateMatcher<'t> {
    tree: &'t MatchTree,
}

impl<'t> TemplateMatcher<'t> {
    /// Create a matcher over `tree`.
    pub fn new(tree: &'t MatchTree) -> Self {
        Self { tree }
    }

    /// Match a single content string.
    ///
    /// # Examples
    ///
    /// ```
    /// use logzip::template::{templates_from_lines, MatchTree, TemplateMatcher};
    ///
    /// let templates = templates_from_lines(["Deleting block <*>", "Deleting block <*> file <*>"]);
    /// let tree = MatchTree::build(&templates).unwrap();
    /// let result = TemplateMatcher::new(&tree).match_content("Deleting block blk_1 file /tmp/a");
    ///
    /// assert_eq!(result.template.as_deref(), Some("Deleting block <*> file <*>"));
    /// assert_eq!(result.parameters, vec!["blk_1", "/tmp/a"]);
    /// ```
    pub fn match_content(&self, content: &str) -> MatchResult {
        if self.tree.is_exact(content) {
            return MatchResult {
                template: Some(content.to_string()),
                parameters: Vec::new(),
            };
        }

        let tokens = tokenize(content);
        let mut found = Vec::new();
        let mut parameters = Vec::new();
        self.search(MatchTree::ROOT, &tokens, &mut parameters, &mut found);
        debug_assert!(parameters.is_empty());

        found
            .into_iter()
            .min_by_key(|c| (Reverse(c.leaf.length), c.leaf.wildcards))
            .map(|best| MatchResult {
                template: Some(best.leaf.template.clone()),
                parameters: best.parameters,
            })
            .unwrap_or_else(MatchResult::no_match)
    }

    fn search(
        &self,
        node: NodeId,
        tokens: &[&str],
        parameters: &mut Vec<String>,
        found: &mut Vec<Candidate<'t>>,
    ) {
        let current = self.tree.node(node);

        if tokens.is_empty() {
            self.collect(node, parameters, found);
            if let Some(wild) = current.child(WILDCARD) {
                parameters.push(String::new());
                self.collect(wild, parameters, found);
                parameters.pop();
            }
            return;
        }

        if let Some(child) = current.child(tokens[0]) {
            self.search(child, &tokens[1..], parameters, found);
        }

        let Some(wild) = current.child(WILDCARD) else {
            return;
        };
        let below = self.tree.node(wild);

        for split in 0..tokens.len() {
            if below.continues_with(tokens[split]) {
                parameters.push(tokens[..split].concat());
                self.search(wild, &tokens[split..], parameters, found);
                parameters.pop();
            }
        }

        // the wildcard swallows everything that is left
        parameters.push(tokens.concat());
        self.search(wild, &[], parameters, found);
        parameters.pop();
    }

    fn collect(&self, node: NodeId, parameters: &[String], found: &mut Vec<Candidate<'t>>) {
        let tree: &'t MatchTree = self.tree;
        for leaf in tree.node(node).leaves() {
            found.push(Candidate {
                leaf,
                parameters: parameters.to_vec(),
            });
        }
    }

    /// Match every distinct string of `contents` exactly once.
    ///
    /// Distinct contents are split into contiguous slices, one per worker,
    /// and matched on the worker pool. The per-worker maps have disjoint keys
    /// and are merged by plain union. A failing worker aborts the whole call.
    pub fn match_all<S: AsRef<str> + Sync>(
        &self,
        contents: &[S],
        workers: usize,
    ) -> Result<HashMap<String, MatchResult>> {
        let distinct = distinct_in_order(contents);
        log::info!(
            "Matching {} distinct contents out of {} with {} worker(s)",
            distinct.len(),
            contents.len(),
            workers
        );

        let partial = pool::run_partitioned(&distinct, workers, "template matching", |slice| {
            log::debug!("Matcher worker starts on {} contents", slice.len());
            slice
                .iter()
                .map(|content| (content.to_string(), self.match_content(content)))
                .collect::<HashMap<_, _>>()
        })?;

        let mut memo = HashMap::with_capacity(distinct.len());
        for map in partial {
            memo.extend(map);
        }
        Ok(memo)
    }
}

fn distinct_in_order<S: AsRef<str>>(contents: &[S]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::with_capacity(contents.len());
    contents
        .iter()
        .map(AsRef::as_ref)
        .filter(|c| seen.insert(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::templates_from_lines;

    fn build(lines: &[&str]) -> MatchTree {
        MatchTree::build(&templates_from_lines(lines.iter().copied())).unwrap()
    }

    fn matched(tree: &MatchTree, content: &str) -> (Option<String>, Vec<String>) {
        let result = TemplateMatcher::new(tree).match_content(content);
        (result.template, result.parameters)
    }

    #[test]
    fn test_longest_match_wins() {
        let tree = build(&["Deleting block <*>", "Deleting block <*> file <*>"]);
        let (template, params) = matched(&tree, "Deleting block blk_1 file /tmp/a");
        assert_eq!(template.as_deref(), Some("Deleting block <*> file <*>"));
        assert_eq!(params, vec!["blk_1", "/tmp/a"]);
    }

    #[test]
    fn test_shorter_template_when_longer_impossible() {
        let tree = build(&["Deleting block <*>", "Deleting block <*> file <*>"]);
        let (template, params) = matched(&tree, "Deleting block blk_42");
        assert_eq!(template.as_deref(), Some("Deleting block <*>"));
        assert_eq!(params, vec!["blk_42"]);
    }

    #[test]
    fn test_fewer_wildcards_break_ties() {
        // both compile to five tokens
        let tree = build(&["a <*> <*>", "a b <*>"]);
        let (template, params) = matched(&tree, "a b c");
        assert_eq!(template.as_deref(), Some("a b <*>"));
        assert_eq!(params, vec!["c"]);
    }

    #[test]
    fn test_equal_rank_keeps_first_found() {
        let tree = build(&["user <*> ok", "<*> alice ok"]);
        let (template, params) = matched(&tree, "user alice ok");
        assert_eq!(template.as_deref(), Some("user <*> ok"));
        assert_eq!(params, vec!["alice"]);
    }

    #[test]
    fn test_exact_match_priority() {
        let tree = build(&["Starting <*>", "Starting server"]);
        let (template, params) = matched(&tree, "Starting server");
        assert_eq!(template.as_deref(), Some("Starting server"));
        assert!(params.is_empty());

        let (template, params) = matched(&tree, "Starting worker");
        assert_eq!(template.as_deref(), Some("Starting <*>"));
        assert_eq!(params, vec!["worker"]);
    }

    #[test]
    fn test_no_match() {
        let tree = build(&["Deleting block <*>", "Deleting block <*> file <*>"]);
        let result = TemplateMatcher::new(&tree).match_content("completely unrelated message");
        assert_eq!(result, MatchResult::no_match());
        assert_eq!(result.template_str(), NO_MATCH);
        assert!(!result.is_match());
    }

    #[test]
    fn test_wildcard_spanning_many_tokens() {
        let tree = build(&["Receiving block <*> src: <*> dest: <*>"]);
        let (template, params) = matched(
            &tree,
            "Receiving block blk_-160899 src: /10.250.19.102:54106 dest: /10.250.19.102:50010",
        );
        assert!(template.is_some());
        assert_eq!(
            params,
            vec!["blk_-160899", "/10.250.19.102:54106", "/10.250.19.102:50010"]
        );
    }

    #[test]
    fn test_trailing_wildcard_binds_empty() {
        let tree = build(&["Closing <*>"]);
        let (template, params) = matched(&tree, "Closing ");
        assert_eq!(template.as_deref(), Some("Closing <*>"));
        assert_eq!(params, vec![""]);
    }

    #[test]
    fn test_leading_wildcard() {
        let tree = build(&["<*> connected"]);
        let (template, params) = matched(&tree, "10.0.0.1 connected");
        assert_eq!(template.as_deref(), Some("<*> connected"));
        assert_eq!(params, vec!["10.0.0.1"]);
    }

    #[test]
    fn test_wildcard_inside_word() {
        let tree = build(&["generating core.<*>"]);
        let (template, params) = matched(&tree, "generating core.862");
        assert_eq!(template.as_deref(), Some("generating core.<*>"));
        assert_eq!(params, vec!["862"]);
    }

    #[test]
    fn test_truncated_template_ignores_tail() {
        let original = "open <*> <*> <*> <*> <*> <*> <*> LITERAL";
        let tree = build(&[original]);
        // tail literal differs from the template: still matched
        let (template, params) = matched(&tree, "open a b c d e f g SOMETHING ELSE");
        assert_eq!(template.as_deref(), Some(original));
        assert_eq!(params, vec!["a b c d e f g SOMETHING ELSE"]);
    }

    #[test]
    fn test_parameter_buffer_is_balanced() {
        // several split points are tried and abandoned; the winner must still
        // carry exactly one value per wildcard of its own path
        let tree = build(&["x <*> y <*>", "x <*>"]);
        let (template, params) = matched(&tree, "x a y b y c");
        assert_eq!(template.as_deref(), Some("x <*> y <*>"));
        assert_eq!(params, vec!["a", "b y c"]);
    }

    #[test]
    fn test_match_all_sequential_and_parallel_agree() {
        let tree = build(&["Deleting block <*>", "Served block <*> to <*>", "Shutdown"]);
        let contents: Vec<String> = (0..200)
            .map(|i| match i % 4 {
                0 => format!("Deleting block blk_{}", i % 7),
                1 => format!("Served block blk_{} to /10.0.0.{}", i, i % 5),
                2 => "Shutdown".to_string(),
                _ => format!("garbage {}", i % 3),
            })
            .collect();

        let matcher = TemplateMatcher::new(&tree);
        let sequential = matcher.match_all(&contents, 1).unwrap();
        let parallel = matcher.match_all(&contents, 4).unwrap();
        assert_eq!(sequential, parallel);

        let distinct: std::collections::HashSet<_> = contents.iter().collect();
        assert_eq!(sequential.len(), distinct.len());
        assert_eq!(
            sequential["Served block blk_1 to /10.0.0.1"].parameters,
            vec!["blk_1", "/10.0.0.1"]
        );
    }

    #[test]
    fn test_distinct_in_order() {
        let contents = ["b", "a", "b", "c", "a"];
        assert_eq!(distinct_in_order(&contents), vec!["b", "a", "c"]);
    }
}
