//! Front-matter extraction.
//!
//! A note may open with a YAML block fenced by `---` lines. The block is parsed into
//! [`Metadata`]; `tags` and `aliases` are normalised to ordered string lists whether they were
//! written as a YAML sequence or a comma separated string. A block that fails to parse never
//! fails the note: the whole original text is kept as body and the note carries no metadata.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;

static FRONTMATTER_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A---[ \t]*\r?\n(?:([\s\S]*?)\r?\n)?---[ \t]*(?:\r?\n|\z)")
        .expect("front-matter pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub aliases: Vec<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataStatus {
    /// The note has no front-matter block.
    Absent,
    Parsed,
    /// A block was present but could not be read; carries the parser's complaint.
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument<'a> {
    pub metadata: Metadata,
    pub body: &'a str,
    pub status: MetadataStatus,
}

pub fn extract_frontmatter(text: &str) -> ExtractedDocument<'_> {
    let Some(captures) = FRONTMATTER_BLOCK.captures(text) else {
        return ExtractedDocument {
            metadata: Metadata::default(),
            body: text,
            status: MetadataStatus::Absent,
        };
    };
    let block = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let block_end = captures.get(0).map(|m| m.end()).unwrap_or_default();

    match parse_metadata(block) {
        Ok(metadata) => ExtractedDocument {
            metadata,
            body: &text[block_end..],
            status: MetadataStatus::Parsed,
        },
        Err(reason) => ExtractedDocument {
            metadata: Metadata::default(),
            body: text,
            status: MetadataStatus::Malformed(reason),
        },
    }
}

fn parse_metadata(block: &str) -> Result<Metadata, String> {
    let value: Value = serde_yaml::from_str(block).map_err(|e| e.to_string())?;
    match value {
        Value::Null => Ok(Metadata::default()),
        Value::Mapping(_) => Ok(Metadata {
            title: value.get("title").and_then(scalar_to_string),
            tags: string_list(value.get("tags")),
            aliases: string_list(value.get("aliases")),
            created: value.get("created").and_then(scalar_to_string),
            modified: value.get("modified").and_then(scalar_to_string),
        }),
        _ => Err("front-matter is not a key/value mapping".to_string()),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Either `[a, b]` or `"a, b"` becomes `vec!["a", "b"]`.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let entries = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(other) => scalar_to_string(other).into_iter().collect(),
    };
    entries
        .into_iter()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}
