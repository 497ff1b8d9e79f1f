//! Message tokenizer shared by the match tree and the matcher.
//!
//! Text is split into three kinds of token:
//!
//! - the wildcard marker `<*>`, kept whole
//! - maximal runs of ASCII letters
//! - every other character on its own
//!
//! Adjacent wildcards collapse into a single one, so `a <*><*>` and `a <*>`
//! tokenize identically. Templates and messages go through the same function,
//! which is what makes their token sequences comparable.

/// The wildcard marker used in templates.
pub const WILDCARD: &str = "<*>";

/// Legacy numeric placeholder, normalized to [`WILDCARD`] before compilation.
pub const NUM_PLACEHOLDER: &str = "<NUM>";

/// Templates with more wildcards than this are truncated before compilation.
pub const MAX_WILDCARDS: usize = 5;

/// Split `text` into tokens.
///
/// Tokens borrow from `text`. Without adjacent wildcards in the input the
/// tokens concatenate back to `text` exactly.
///
/// # Examples
///
/// ```
/// use logzip::template::tokenize;
///
/// let tokens = tokenize("Deleting block <*> file");
/// assert_eq!(tokens, vec!["Deleting", " ", "block", " ", "<*>", " ", "file"]);
/// ```
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = Vec::with_capacity(text.len() / 2 + 1);
    let bytes = text.as_bytes();
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let len = if rest.starts_with(WILDCARD) {
            WILDCARD.len()
        } else if bytes[pos].is_ascii_alphabetic() {
            rest.bytes()
                .position(|b| !b.is_ascii_alphabetic())
                .unwrap_or(rest.len())
        } else {
            // a single (possibly multi-byte) character
            rest.chars().next().map(char::len_utf8).unwrap_or(1)
        };

        let token = &text[pos..pos + len];
        let repeated_wildcard = token == WILDCARD && tokens.last() == Some(&WILDCARD);
        if !repeated_wildcard {
            tokens.push(token);
        }
        pos += len;
    }

    tokens
}

/// Number of wildcard markers in a template string.
pub fn wildcard_count(template: &str) -> usize {
    template.matches(WILDCARD).count()
}

/// Whether a template string has any variable part.
pub fn has_wildcard(template: &str) -> bool {
    template.contains(WILDCARD) || template.contains(NUM_PLACEHOLDER)
}

/// Normalize a template before tokenization.
///
/// `<NUM>` becomes `<*>`. A template with more than [`MAX_WILDCARDS`]
/// wildcards is cut right after its first wildcard: such templates have too
/// few literal anchors to match precisely, and their backtracking cost grows
/// combinatorially. Matches against a truncated template may under-extract
/// trailing parameters.
pub fn preprocess_template(template: &str) -> String {
    let normalized = template.replace(NUM_PLACEHOLDER, WILDCARD);
    if wildcard_count(&normalized) > MAX_WILDCARDS {
        if let Some(first) = normalized.find(WILDCARD) {
            return normalized[..first + WILDCARD.len()].to_string();
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_letters_and_symbols() {
        assert_eq!(
            tokenize("blk_123 ok"),
            vec!["blk", "_", "1", "2", "3", " ", "ok"]
        );
    }

    #[test]
    fn test_tokenize_wildcard_is_one_token() {
        assert_eq!(tokenize("bglio<*>:"), vec!["bglio", "<*>", ":"]);
    }

    #[test]
    fn test_tokenize_collapses_adjacent_wildcards() {
        assert_eq!(tokenize("a <*><*><*>."), vec!["a", " ", "<*>", "."]);
        assert_eq!(tokenize("a <*><*>"), tokenize("a <*>"));
    }

    #[test]
    fn test_tokenize_separated_wildcards_kept() {
        assert_eq!(tokenize("<*> <*>"), vec!["<*>", " ", "<*>"]);
    }

    #[test]
    fn test_tokenize_partial_marker() {
        assert_eq!(tokenize("<*"), vec!["<", "*"]);
        assert_eq!(tokenize("<NUM>"), vec!["<", "NUM", ">"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_tokenize_non_ascii() {
        assert_eq!(tokenize("café ü"), vec!["caf", "é", " ", "ü"]);
    }

    #[test]
    fn test_tokenize_lossless() {
        let text = "Receiving block blk_-1608999687919862906 src: /10.250.19.102:54106";
        assert_eq!(tokenize(text).concat(), text);
        assert_eq!(tokenize(text), tokenize(text));
    }

    #[test]
    fn test_preprocess_num_placeholder() {
        assert_eq!(preprocess_template("core.<NUM>"), "core.<*>");
    }

    #[test]
    fn test_preprocess_keeps_five_wildcards() {
        let template = "<*> a <*> b <*> c <*> d <*>";
        assert_eq!(preprocess_template(template), template);
    }

    #[test]
    fn test_preprocess_truncates_many_wildcards() {
        let template = "open <*> <*> <*> <*> <*> <*> <*> done";
        assert_eq!(preprocess_template(template), "open <*>");
    }

    #[test]
    fn test_has_wildcard() {
        assert!(has_wildcard("a <*>"));
        assert!(has_wildcard("a <NUM>"));
        assert!(!has_wildcard("plain text"));
        assert_eq!(wildcard_count("<*> x <*>"), 2);
    }
}
