//! Frontmatter parsing from markdown files.

use crate::models::Metadata;
use regex::Regex;
use serde_yaml::Value;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Missing closing `---` delimiter")]
    MissingClosingDelimiter,

    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Front matter must be a mapping of `key: value` pairs")]
    NotAMapping,

    #[error("Front matter keys must be plain scalars")]
    InvalidKey,

    #[error("Field `{0}` must be a scalar value")]
    NonScalarValue(String),
}

static OPEN_REGEX: OnceLock<Regex> = OnceLock::new();
static CLOSE_REGEX: OnceLock<Regex> = OnceLock::new();

fn open_regex() -> &'static Regex {
    OPEN_REGEX.get_or_init(|| Regex::new(r"^---[ \t]*\r?\n").unwrap())
}

fn close_regex() -> &'static Regex {
    CLOSE_REGEX.get_or_init(|| Regex::new(r"(?m)^---[ \t]*(?:\r?\n|\r?$)").unwrap())
}

/// Split a document into its raw metadata block and body.
///
/// A document whose first line is not `---` has no metadata block; the
/// whole text is returned as the body. A leading byte-order mark is skipped.
pub fn split_frontmatter(content: &str) -> Result<(Option<&str>, &str), FrontmatterError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let Some(open) = open_regex().find(content) else {
        return Ok((None, content));
    };

    let rest = &content[open.end()..];
    let close = close_regex()
        .find(rest)
        .ok_or(FrontmatterError::MissingClosingDelimiter)?;

    Ok((Some(&rest[..close.start()]), &rest[close.end()..]))
}

/// Parse frontmatter from markdown content
///
/// Returns a tuple of (metadata, markdown_body).
/// If no frontmatter is present, returns empty metadata with the full content as body.
///
/// # Example
///
/// ```
/// use inkpress_core::frontmatter::parse_frontmatter;
///
/// let content = "---\nheading: My Post\ndate: 1-1-2023\n---\n# Hello World\n";
///
/// let (meta, body) = parse_frontmatter(content).unwrap();
/// assert_eq!(meta["heading"], "My Post");
/// assert_eq!(meta["date"], "1-1-2023");
/// assert!(body.trim().starts_with("# Hello World"));
/// ```
pub fn parse_frontmatter(content: &str) -> Result<(Metadata, String), FrontmatterError> {
    let (block, body) = split_frontmatter(content)?;

    let metadata = match block {
        Some(yaml) => parse_metadata(yaml)?,
        None => Metadata::new(),
    };

    Ok((metadata, body.to_string()))
}

fn parse_metadata(yaml: &str) -> Result<Metadata, FrontmatterError> {
    if yaml.trim().is_empty() {
        return Ok(Metadata::new());
    }

    let mapping = match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(Metadata::new()),
        _ => return Err(FrontmatterError::NotAMapping),
    };

    let mut metadata = Metadata::new();
    for (key, value) in mapping {
        if key.is_null() {
            return Err(FrontmatterError::InvalidKey);
        }
        let key = scalar_to_string(&key).ok_or(FrontmatterError::InvalidKey)?;
        let value =
            scalar_to_string(&value).ok_or_else(|| FrontmatterError::NonScalarValue(key.clone()))?;
        metadata.insert(key, value);
    }

    Ok(metadata)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_frontmatter() {
        let content = r#"---
heading: Test Post
subheading: A test post
date: 1-1-2023
---

# Hello World

This is the content."#;

        let (meta, body) = parse_frontmatter(content).unwrap();
        assert_eq!(meta["heading"], "Test Post");
        assert_eq!(meta["subheading"], "A test post");
        assert_eq!(meta["date"], "1-1-2023");
        assert!(body.contains("# Hello World"));
        assert!(body.contains("This is the content."));
    }

    #[test]
    fn test_scalars_are_stringified() {
        let content = "---\norder: 3\ndraft: false\nratio: 1.5\nempty:\n---\nBody";

        let (meta, _) = parse_frontmatter(content).unwrap();
        assert_eq!(meta["order"], "3");
        assert_eq!(meta["draft"], "false");
        assert_eq!(meta["ratio"], "1.5");
        assert_eq!(meta["empty"], "");
    }

    #[test]
    fn test_parse_no_frontmatter() {
        let content = "# Just Content\n\nNo frontmatter here.";
        let (meta, body) = parse_frontmatter(content).unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_empty_block() {
        let (meta, body) = parse_frontmatter("---\n---\nBody").unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_closing_delimiter_at_end_of_input() {
        let (meta, body) = parse_frontmatter("---\nheading: Only\n---").unwrap();
        assert_eq!(meta["heading"], "Only");
        assert_eq!(body, "");
    }

    #[test]
    fn test_crlf_line_endings() {
        let (meta, body) = parse_frontmatter("---\r\nheading: Win\r\n---\r\nBody").unwrap();
        assert_eq!(meta["heading"], "Win");
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_crlf_closing_delimiter_at_end_of_input() {
        let (meta, body) = parse_frontmatter("---\r\nheading: W\r\n---\r").unwrap();
        assert_eq!(meta["heading"], "W");
        assert_eq!(body, "");
    }

    #[test]
    fn test_byte_order_mark_is_skipped() {
        let (meta, body) = parse_frontmatter("\u{feff}---\nheading: B\n---\nbody").unwrap();
        assert_eq!(meta["heading"], "B");
        assert_eq!(body, "body");

        let (meta, body) = parse_frontmatter("\u{feff}# Plain").unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, "# Plain");
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let content = "---\nheading: Hello\ndate: 1-1-2023\n\n# Hi\n";
        match parse_frontmatter(content) {
            Err(FrontmatterError::MissingClosingDelimiter) => {}
            other => panic!("Expected MissingClosingDelimiter, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_yaml() {
        let content = r#"---
heading: Test
invalid yaml: [unclosed
---

Content."#;

        assert!(matches!(
            parse_frontmatter(content),
            Err(FrontmatterError::YamlError(_))
        ));
    }

    #[test]
    fn test_non_mapping_block() {
        let content = "---\n- one\n- two\n---\nBody";
        assert!(matches!(
            parse_frontmatter(content),
            Err(FrontmatterError::NotAMapping)
        ));
    }

    #[test]
    fn test_nested_value_rejected() {
        let content = "---\nheading: Tagged\ntags:\n  - rust\n---\nBody";
        match parse_frontmatter(content) {
            Err(FrontmatterError::NonScalarValue(field)) => assert_eq!(field, "tags"),
            other => panic!("Expected NonScalarValue, got {:?}", other),
        }
    }

    #[test]
    fn test_horizontal_rule_is_not_a_block() {
        let content = "Intro\n\n---\n\nMore";
        let (meta, body) = parse_frontmatter(content).unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, content);
    }
}
