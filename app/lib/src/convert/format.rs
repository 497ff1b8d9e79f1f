//! Log line format strings.
//!
//! A format such as `<Date> <Time> <Pid> <Level> <Component>: <Content>`
//! declares the header fields of every line. It compiles to an anchored regex
//! with one lazy named group per field; the literal text between fields must
//! appear verbatim, except that runs of spaces match any run of whitespace.

use regex::Regex;

use crate::error::{LogzipError, Result};

/// Name of the free-text field the template matcher works on.
pub const CONTENT_FIELD: &str = "Content";

/// A compiled log line format.
#[derive(Debug, Clone)]
pub struct LogFormat {
    format: String,
    headers: Vec<String>,
    regex: Regex,
}

impl LogFormat {
    /// Compile a format string.
    ///
    /// # Errors
    ///
    /// - [`LogzipError::MissingLogFormat`] for an empty format
    /// - [`LogzipError::InvalidLogFormat`] when the format declares no field
    ///   or the generated regex does not compile (e.g. duplicate field names)
    pub fn parse(format: &str) -> Result<Self> {
        let format = format.trim();
        if format.is_empty() {
            return Err(LogzipError::MissingLogFormat);
        }

        let (headers, pattern) = build_regex(format)?;
        let regex = Regex::new(&pattern).map_err(|e| LogzipError::InvalidLogFormat {
            format: format.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            format: format.to_string(),
            headers,
            regex,
        })
    }

    /// The format string as given (trimmed).
    pub fn as_str(&self) -> &str {
        &self.format
    }

    /// Declared field names, in order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Position of the `Content` field, if declared.
    pub fn content_index(&self) -> Option<usize> {
        self.headers.iter().position(|h| h == CONTENT_FIELD)
    }

    /// The compiled regex.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Split a line into its field values, in header order.
    pub fn extract(&self, line: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(line)?;
        Some(
            self.headers
                .iter()
                .map(|h| caps.name(h).map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        )
    }
}

/// Turn a format string into its field names and regex source.
pub fn build_regex(format: &str) -> Result<(Vec<String>, String)> {
    let mut headers = Vec::new();
    let mut pattern = String::from("^");
    let mut rest = format;

    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>').map(|c| open + c) else {
            break;
        };
        let name = &rest[open + 1..close];
        if name.is_empty() || name.contains('<') {
            // not a field: keep the '<' as literal text and continue after it
            push_literal(&mut pattern, &rest[..open + 1]);
            rest = &rest[open + 1..];
            continue;
        }
        push_literal(&mut pattern, &rest[..open]);
        pattern.push_str(&format!("(?P<{}>.*?)", name));
        headers.push(name.to_string());
        rest = &rest[close + 1..];
    }
    push_literal(&mut pattern, rest);
    pattern.push('$');

    if headers.is_empty() {
        return Err(LogzipError::InvalidLogFormat {
            format: format.to_string(),
            message: "no <Field> placeholder".to_string(),
        });
    }
    Ok((headers, pattern))
}

fn push_literal(pattern: &mut String, literal: &str) {
    let mut pieces = literal.split(' ').peekable();
    while let Some(piece) = pieces.next() {
        pattern.push_str(&regex::escape(piece));
        if pieces.peek().is_some() {
            // collapse runs of spaces into one \s+
            while pieces.peek() == Some(&"") {
                pieces.next();
            }
            pattern.push_str(r"\s+");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HDFS: &str = "<Date> <Time> <Pid> <Level> <Component>: <Content>";

    #[test]
    fn test_headers() {
        let format = LogFormat::parse(HDFS).unwrap();
        assert_eq!(
            format.headers(),
            &["Date", "Time", "Pid", "Level", "Component", "Content"]
        );
        assert_eq!(format.content_index(), Some(5));
    }

    #[test]
    fn test_extract_hdfs_line() {
        let format = LogFormat::parse(HDFS).unwrap();
        let fields = format
            .extract("081109 203615 148 INFO dfs.DataNode$PacketResponder: PacketResponder 1 for block blk_38865049064139660 terminating")
            .unwrap();
        assert_eq!(fields[0], "081109");
        assert_eq!(fields[2], "148");
        assert_eq!(fields[4], "dfs.DataNode$PacketResponder");
        assert_eq!(
            fields[5],
            "PacketResponder 1 for block blk_38865049064139660 terminating"
        );
    }

    #[test]
    fn test_extract_failure() {
        let format = LogFormat::parse("<Level>: <Content>").unwrap();
        assert!(format.extract("no separator here").is_none());
    }

    #[test]
    fn test_spaces_match_any_whitespace() {
        let format = LogFormat::parse("<A>  <B>").unwrap();
        assert_eq!(format.extract("x \t y").unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_literal_text_is_escaped() {
        let format = LogFormat::parse("[<Time>] <Level> (<Component>) <Content>").unwrap();
        let fields = format.extract("[10:00] WARN (net.io) link down").unwrap();
        assert_eq!(fields, vec!["10:00", "WARN", "net.io", "link down"]);
        assert!(format.extract("10:00 WARN net.io link down").is_none());
    }

    #[test]
    fn test_build_regex_source() {
        let (headers, pattern) = build_regex("<Level> <Content>").unwrap();
        assert_eq!(headers, vec!["Level", "Content"]);
        assert_eq!(pattern, r"^(?P<Level>.*?)\s+(?P<Content>.*?)$");
    }

    #[test]
    fn test_missing_and_invalid_formats() {
        assert!(matches!(LogFormat::parse("  "), Err(LogzipError::MissingLogFormat)));
        assert!(matches!(
            LogFormat::parse("no fields at all"),
            Err(LogzipError::InvalidLogFormat { .. })
        ));
        assert!(matches!(
            LogFormat::parse("<A> <A>"),
            Err(LogzipError::InvalidLogFormat { .. })
        ));
    }

    #[test]
    fn test_no_content_field() {
        let format = LogFormat::parse("<Date> <Time>").unwrap();
        assert_eq!(format.content_index(), None);
    }
}
