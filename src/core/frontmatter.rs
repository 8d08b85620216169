use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

/// Key excluded from the property list offered by a template.
pub const ENTITY_TYPE_KEY: &str = "entity-type";

lazy_static! {
    static ref FRONTMATTER_RE: Regex =
        Regex::new(r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|\z)").unwrap();
}

/// Flat `key: value` pairs from a leading `---` block.
///
/// This is a line-oriented scan, not a YAML parser: nested structures,
/// quoting and escapes are not understood. Keys keep the position of their
/// first occurrence while later duplicates overwrite the value.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Frontmatter {
    entries: Vec<(String, String)>,
    raw: String,
    span: Option<Range<usize>>,
}

impl Frontmatter {
    pub fn parse(content: &str) -> Self {
        let Some(caps) = FRONTMATTER_RE.captures(content) else {
            return Self::default();
        };
        let Some(block) = caps.get(1) else {
            return Self::default();
        };

        let mut fm = Self {
            entries: Vec::new(),
            raw: block.as_str().to_string(),
            span: Some(block.range()),
        };

        for line in block.as_str().lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            fm.insert(key, value.trim());
        }

        tracing::debug!(keys = fm.entries.len(), "scanned frontmatter");
        fm
    }

    fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the document had a delimited block at all, even an empty one.
    pub fn has_block(&self) -> bool {
        self.span.is_some()
    }

    /// Block body as written, without the `---` fences.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Byte range of the block body inside the scanned document.
    pub fn span(&self) -> Option<Range<usize>> {
        self.span.clone()
    }
}

pub fn parse_frontmatter(content: &str) -> Frontmatter {
    Frontmatter::parse(content)
}

/// Property keys a template offers, in scan order, without `entity-type`.
pub fn template_properties(content: &str) -> Vec<String> {
    Frontmatter::parse(content)
        .keys()
        .filter(|k| *k != ENTITY_TYPE_KEY)
        .map(String::from)
        .collect()
}
