/// Lines, tags and choices as produced by the script runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between a tag's key and its value.
pub const TAG_DELIMITER: char = ':';

/// A single unit of narrative text with the raw tags attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Line {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(text: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            text: text.into(),
            tags,
        }
    }
}

/// A parsed `key:value` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    /// Split a raw tag on the first delimiter. Key and value are trimmed.
    /// Returns `None` when the delimiter is missing or the key is empty.
    pub fn parse(raw: &str) -> Option<Tag> {
        let (key, value) = raw.split_once(TAG_DELIMITER)?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(Tag {
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.key, TAG_DELIMITER, self.value)
    }
}

/// One selectable branch, in the order the runtime reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub index: usize,
    pub text: String,
}

impl Choice {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}
