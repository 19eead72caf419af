use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::tree::RenderTree;
use crate::util::title_case;

// =============================================================================
// Front matter
// =============================================================================

/// Front matter metadata parsed from a post header.
///
/// Keys are exactly the keys written in the header. Typed accessors cover the
/// fields the page template knows about; everything else is still available
/// to templates and to `{key}` expressions in the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontMatter(BTreeMap<String, serde_yaml::Value>);

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_yaml::Value) {
        self.0.insert(key.into(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Get a field rendered as display text. Only scalars qualify.
    pub fn scalar(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn title(&self) -> Option<String> {
        self.scalar("title")
    }

    pub fn description(&self) -> Option<String> {
        self.scalar("description")
    }

    /// The post date as written (`2019-08-07` style dates sort correctly as text).
    pub fn date(&self) -> Option<String> {
        self.scalar("date")
    }

    pub fn author(&self) -> Option<String> {
        self.scalar("author")
    }

    pub fn views(&self) -> Option<u64> {
        match self.0.get("views")? {
            serde_yaml::Value::Number(n) => n.as_u64(),
            serde_yaml::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn tags(&self) -> Vec<String> {
        match self.0.get("tags") {
            Some(serde_yaml::Value::Sequence(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            Some(serde_yaml::Value::String(s)) => s
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FrontMatterError {
    #[error("front matter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,

    #[error("front matter block opened with '---' is never closed")]
    Unterminated,
}

/// Result of splitting a post into front matter and body.
#[derive(Debug)]
pub struct ParsedContent {
    /// The parsed front matter (empty if the post has no header)
    pub front_matter: FrontMatter,
    /// The body, exactly as written after the header block
    pub content: String,
}

const DELIMITER: &str = "---";

/// Split front matter from a post.
///
/// Front matter is a YAML block delimited by `---` lines at the very start
/// of the file:
///
/// ```markdown
/// ---
/// title: My Post
/// date: 2019-08-07
/// ---
/// # Content starts here
/// ```
///
/// The header is optional. When present, the body is everything after the
/// closing delimiter line, byte for byte.
pub fn split_front_matter(raw: &str) -> Result<ParsedContent, FrontMatterError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let Some(header_start) = opening_delimiter_len(raw) else {
        return Ok(ParsedContent {
            front_matter: FrontMatter::default(),
            content: raw.to_string(),
        });
    };

    // Walk the lines after the opening delimiter looking for the closing one
    let mut offset = header_start;
    let mut closing = None;
    for line in raw[header_start..].split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            closing = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    let (yaml_end, body_start) = closing.ok_or(FrontMatterError::Unterminated)?;

    let yaml_content = &raw[header_start..yaml_end];
    let front_matter = parse_header(yaml_content)?;

    Ok(ParsedContent {
        front_matter,
        content: raw[body_start..].to_string(),
    })
}

/// Length of the opening `---` line including its line break, if present.
fn opening_delimiter_len(raw: &str) -> Option<usize> {
    let rest = raw.strip_prefix(DELIMITER)?;
    if rest.starts_with("\r\n") {
        Some(DELIMITER.len() + 2)
    } else if rest.starts_with('\n') {
        Some(DELIMITER.len() + 1)
    } else {
        None
    }
}

fn parse_header(yaml: &str) -> Result<FrontMatter, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }

    match serde_yaml::from_str::<serde_yaml::Value>(yaml)? {
        serde_yaml::Value::Mapping(mapping) => {
            let mut front_matter = FrontMatter::default();
            for (key, value) in mapping {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    _ => return Err(FrontMatterError::NotAMapping),
                };
                front_matter.insert(key, value);
            }
            Ok(front_matter)
        }
        serde_yaml::Value::Null => Ok(FrontMatter::default()),
        _ => Err(FrontMatterError::NotAMapping),
    }
}

// =============================================================================
// Documents
// =============================================================================

/// A post read from the content directory. Immutable once read.
#[derive(Debug, Clone)]
pub struct Document {
    /// Stable identifier derived from the file name
    pub slug: String,
    /// Front matter metadata
    pub front_matter: FrontMatter,
    /// The body without the header block
    pub body: String,
}

impl Document {
    /// Build a document from raw file content.
    pub fn from_source(slug: String, raw: &str) -> Result<Self, FrontMatterError> {
        let parsed = split_front_matter(raw)?;
        Ok(Self {
            slug,
            front_matter: parsed.front_matter,
            body: parsed.content,
        })
    }
}

/// A post after compilation: everything the page needs, and nothing else.
///
/// Stored as the page's static props and consumed by the page render
/// without touching the source file again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledDocument {
    pub slug: String,
    pub front_matter: FrontMatter,
    pub render_tree: RenderTree,
    /// Estimated reading time, rounded up
    pub reading_minutes: u32,
}

impl CompiledDocument {
    /// Get the post title, falling back to the slug if not in front matter.
    pub fn title(&self) -> String {
        self.front_matter
            .title()
            .unwrap_or_else(|| title_case(&self.slug))
    }
}
