//! Front-matter parsing

use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Opening and closing marker of a YAML metadata block
const MARKER: &str = "---";

#[derive(Debug, Error, PartialEq)]
pub enum FrontMatterError {
    #[error("front matter is opened with `---` but never closed")]
    Unterminated,
    #[error("front matter is not valid YAML: {0}")]
    InvalidYaml(String),
    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,
}

/// Untyped metadata block of a content item.
///
/// Keys are kept exactly as written; nothing is validated here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: Mapping,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let Some(rest) = strip_marker_line(content) else {
            return Ok((FrontMatter::default(), content));
        };

        let (yaml, body) = split_at_closing_marker(rest).ok_or(FrontMatterError::Unterminated)?;

        if yaml.trim().is_empty() {
            return Ok((FrontMatter::default(), body));
        }

        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| FrontMatterError::InvalidYaml(e.to_string()))?;

        match value {
            Value::Mapping(fields) => Ok((Self { fields }, body)),
            Value::Null => Ok((FrontMatter::default(), body)),
            _ => Err(FrontMatterError::NotAMapping),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Iterate over `(key, value)` pairs with string keys, in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter_map(|(k, v)| k.as_str().map(|k| (k, v)))
    }
}

/// If `content` starts with a `---` line, return everything after it
fn strip_marker_line(content: &str) -> Option<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content.strip_prefix(MARKER)?;
    let (line_tail, after) = match rest.find('\n') {
        Some(pos) => (&rest[..pos], &rest[pos + 1..]),
        None => (rest, ""),
    };
    // `----` or `--- title` is not an opening marker
    if line_tail.trim().is_empty() {
        Some(after)
    } else {
        None
    }
}

/// Find the first line consisting solely of `---`; return (yaml, body)
fn split_at_closing_marker(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.trim_end() == MARKER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}
