//! Property tests for the tokenizer, the value splitter and the matcher.

use logzip::template::{preprocess_template, wildcard_count, MAX_WILDCARDS};
use logzip::{split_item, templates_from_lines, tokenize, MatchTree, TemplateMatcher, WILDCARD};
use proptest::prelude::*;

/// Log-like text: words, digits, punctuation and the occasional wildcard.
fn log_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[a-zA-Z]{1,8}",
            "[0-9]{1,6}",
            "[ ./:_=#-]",
            Just(" ".to_string()),
            Just(WILDCARD.to_string()),
            "[é中<>*]",
        ],
        0..24,
    )
    .prop_map(|parts| parts.concat())
}

/// Text that never contains a wildcard.
fn plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ./:_=#-]{0,60}"
}

proptest! {
    #[test]
    fn tokenize_is_lossless_without_repeated_wildcards(text in plain_text()) {
        prop_assert_eq!(tokenize(&text).concat(), text);
    }

    #[test]
    fn tokenize_is_idempotent(text in log_text()) {
        let once = tokenize(&text).concat();
        let twice = tokenize(&once).concat();
        prop_assert_eq!(tokenize(&once), tokenize(&twice));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn tokenize_never_repeats_wildcards(text in log_text()) {
        let tokens = tokenize(&text);
        for pair in tokens.windows(2) {
            prop_assert!(!(pair[0] == WILDCARD && pair[1] == WILDCARD));
        }
    }

    #[test]
    fn split_item_concatenates_back(text in log_text()) {
        let parts = split_item(&text);
        prop_assert_eq!(parts.concat(), text);
    }

    #[test]
    fn split_item_alternates(text in log_text()) {
        let parts = split_item(&text);
        prop_assert_eq!(parts.len() % 2, 1);
        for (idx, part) in parts.iter().enumerate() {
            let alnum = part.chars().all(|c| c.is_ascii_alphanumeric());
            let delim = part.chars().all(|c| !c.is_ascii_alphanumeric());
            if idx % 2 == 0 {
                prop_assert!(alnum);
            } else {
                prop_assert!(delim && !part.is_empty());
            }
        }
    }

    #[test]
    fn preprocessed_templates_stay_bounded(text in log_text()) {
        let processed = preprocess_template(&text);
        prop_assert!(wildcard_count(&processed) <= MAX_WILDCARDS);
    }

    #[test]
    fn exact_template_always_wins(content in "[a-z]{1,6}( [a-z0-9]{1,6}){1,4}") {
        let first_word = content.split(' ').next().unwrap_or_default();
        let rival = format!("{} <*>", first_word);

        let rival_only = MatchTree::build(&templates_from_lines([rival.as_str()])).unwrap();
        let fallback = TemplateMatcher::new(&rival_only).match_content(&content);
        prop_assert_eq!(fallback.template.as_deref(), Some(rival.as_str()));

        let templates = templates_from_lines([rival.as_str(), content.as_str()]);
        let tree = MatchTree::build(&templates).unwrap();
        let result = TemplateMatcher::new(&tree).match_content(&content);
        prop_assert_eq!(result.template.as_deref(), Some(content.as_str()));
        prop_assert!(result.parameters.is_empty());
    }

    #[test]
    fn bound_parameters_rebuild_content(
        head in "[a-z]{1,6}",
        middle in "[a-z0-9_./-]{1,12}",
        tail in "[a-z0-9_./:-]{0,12}"
    ) {
        let templates = templates_from_lines([format!("{} <*> done <*>", head)]);
        let tree = MatchTree::build(&templates).unwrap();
        let content = format!("{} {} done {}", head, middle, tail);
        let result = TemplateMatcher::new(&tree).match_content(&content);
        prop_assert!(result.is_match());
        prop_assert_eq!(
            format!("{} {} done {}", head, result.parameters[0], result.parameters[1]),
            content
        );
    }
}
