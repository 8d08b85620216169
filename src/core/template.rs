//! Writes captured values into a template's `key:` lines.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::{Captures, NoExpand, Regex};
use serde::{Deserialize, Serialize};

use super::error::Result;
use super::frontmatter::Frontmatter;

/// Property whose value names the created note.
pub const FILE_NAME_PROPERTY: &str = "full_name";
pub const UNTITLED: &str = "Untitled";

lazy_static! {
    static ref FORBIDDEN_FILENAME_CHARS: Regex = Regex::new(r#"[\\/:*?"<>|]"#).unwrap();
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstitutionMode {
    /// Whole keys at the start of a front matter line.
    #[default]
    Anchored,
    /// Every `key:` occurrence anywhere in the text, one key after another.
    Global,
}

impl fmt::Display for SubstitutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anchored => f.write_str("anchored"),
            Self::Global => f.write_str("global"),
        }
    }
}

impl FromStr for SubstitutionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anchored" => Ok(Self::Anchored),
            "global" => Ok(Self::Global),
            _ => Err(format!("unknown substitution mode '{}' (anchored|global)", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub content: String,
    /// Keys that had a value but no `key:` to land on.
    pub unmatched: Vec<String>,
}

pub fn substitute(
    template: &str,
    values: &[(String, String)],
    mode: SubstitutionMode,
) -> Result<Rendered> {
    let rendered = match mode {
        SubstitutionMode::Anchored => substitute_anchored(template, values)?,
        SubstitutionMode::Global => substitute_global(template, values)?,
    };

    for key in &rendered.unmatched {
        tracing::warn!(key = %key, "template has no line for property");
    }
    Ok(rendered)
}

fn substitute_anchored(template: &str, values: &[(String, String)]) -> Result<Rendered> {
    let keys: Vec<&str> = values.iter().map(|(k, _)| k.as_str()).collect();
    let Some(span) = Frontmatter::parse(template).span() else {
        return Ok(Rendered {
            content: template.to_string(),
            unmatched: keys.iter().map(|k| k.to_string()).collect(),
        });
    };
    if values.is_empty() {
        return Ok(Rendered {
            content: template.to_string(),
            unmatched: Vec::new(),
        });
    }

    // Longest first so no key shadows another in the alternation.
    let mut sorted = keys.clone();
    sorted.sort_by_key(|k| std::cmp::Reverse(k.len()));
    let alternation = sorted
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    // A key line plus any bullet items already listed under it.
    let line_re = Regex::new(&format!(
        r"(?m)^([ \t]*)({}):[^\r\n]*(?:\r?\n[ \t]*-[ \t][^\r\n]*)*",
        alternation
    ))?;

    let lookup: HashMap<&str, &str> = values
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let mut matched: Vec<&str> = Vec::new();

    let block = &template[span.clone()];
    let replaced = line_re.replace_all(block, |caps: &Captures| {
        let indent = &caps[1];
        let key = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let value = lookup.get(key).copied().unwrap_or_default();
        if let Some(k) = keys.iter().find(|k| **k == key) {
            matched.push(*k);
        }
        // Nothing entered: the template's own default stays.
        if value.is_empty() {
            return caps[0].to_string();
        }
        format!("{}{}", indent, key_line(key, value))
    });

    let mut content = String::with_capacity(template.len() + replaced.len());
    content.push_str(&template[..span.start]);
    content.push_str(&replaced);
    content.push_str(&template[span.end..]);

    let unmatched = keys
        .iter()
        .filter(|k| !matched.contains(k))
        .map(|k| k.to_string())
        .collect();
    Ok(Rendered { content, unmatched })
}

fn substitute_global(template: &str, values: &[(String, String)]) -> Result<Rendered> {
    let mut content = template.to_string();
    let mut unmatched = Vec::new();

    for (key, value) in values {
        let re = Regex::new(&format!("{}:", regex::escape(key)))?;
        if !re.is_match(&content) {
            unmatched.push(key.clone());
            continue;
        }
        let replacement = format!("{}: {}", key, value);
        content = re.replace_all(&content, NoExpand(&replacement)).into_owned();
    }

    Ok(Rendered { content, unmatched })
}

fn key_line(key: &str, value: &str) -> String {
    if value.starts_with('\n') {
        format!("{}:{}", key, value)
    } else {
        format!("{}: {}", key, value)
    }
}

/// `<full_name>.md`, or `Untitled.md` when the name is missing or blank.
pub fn note_file_name(values: &[(String, String)]) -> String {
    let name = values
        .iter()
        .rev()
        .find(|(k, _)| k == FILE_NAME_PROPERTY)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(UNTITLED);
    let name = FORBIDDEN_FILENAME_CHARS.replace_all(name, "-");
    format!("{}.md", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_global_disjoint_keys() {
        let out = substitute("a:\nb:", &pairs(&[("a", "1"), ("b", "2")]), SubstitutionMode::Global).unwrap();
        assert_eq!(out.content, "a: 1\nb: 2");
        assert!(out.unmatched.is_empty());
    }

    #[test]
    fn test_anchored_disjoint_keys() {
        let out = substitute(
            "---\na:\nb:\n---\n",
            &pairs(&[("a", "1"), ("b", "2")]),
            SubstitutionMode::Anchored,
        )
        .unwrap();
        assert_eq!(out.content, "---\na: 1\nb: 2\n---\n");
    }

    #[test]
    fn test_anchored_ignores_substring_keys() {
        let template = "---\nevent:\nrel-event:\n---\n";
        let out = substitute(
            template,
            &pairs(&[("event", "Launch"), ("rel-event", "Kickoff")]),
            SubstitutionMode::Anchored,
        )
        .unwrap();
        assert_eq!(out.content, "---\nevent: Launch\nrel-event: Kickoff\n---\n");
    }

    #[test]
    fn test_global_keeps_substring_hazard() {
        let out = substitute(
            "event:\nrel-event:",
            &pairs(&[("event", "A")]),
            SubstitutionMode::Global,
        )
        .unwrap();
        assert_eq!(out.content, "event: A\nrel-event: A");
    }

    #[test]
    fn test_metacharacter_keys_are_literal() {
        let out = substitute(
            "---\nsize(cm):\n---\n",
            &pairs(&[("size(cm)", "12")]),
            SubstitutionMode::Anchored,
        )
        .unwrap();
        assert_eq!(out.content, "---\nsize(cm): 12\n---\n");

        let out = substitute("a.b:", &pairs(&[("a.b", "$1")]), SubstitutionMode::Global).unwrap();
        assert_eq!(out.content, "a.b: $1");
    }

    #[test]
    fn test_anchored_leaves_body_alone() {
        let template = "---\nfull_name:\n---\nfull_name: stays\n";
        let out = substitute(template, &pairs(&[("full_name", "Alice")]), SubstitutionMode::Anchored).unwrap();
        assert_eq!(out.content, "---\nfull_name: Alice\n---\nfull_name: stays\n");
    }

    #[test]
    fn test_anchored_replaces_existing_default() {
        let out = substitute(
            "---\ngender: unknown\n---\n",
            &pairs(&[("gender", "f")]),
            SubstitutionMode::Anchored,
        )
        .unwrap();
        assert_eq!(out.content, "---\ngender: f\n---\n");
    }

    #[test]
    fn test_anchored_keeps_default_for_empty_value() {
        let out = substitute(
            "---\nfull_name:\ngender: unknown\n---\n",
            &pairs(&[("full_name", "Alice"), ("gender", "")]),
            SubstitutionMode::Anchored,
        )
        .unwrap();
        assert_eq!(out.content, "---\nfull_name: Alice\ngender: unknown\n---\n");
        assert!(out.unmatched.is_empty());

        let out = substitute(
            "---\nrel-person:\n  - \"old\"\n---\n",
            &pairs(&[("rel-person", "")]),
            SubstitutionMode::Anchored,
        )
        .unwrap();
        assert_eq!(out.content, "---\nrel-person:\n  - \"old\"\n---\n");
    }

    #[test]
    fn test_list_value_replaces_default_items() {
        let template = "---\nrel-person:\n  - \"old\"\n  - \"older\"\nbirth:\n---\n";
        let out = substitute(
            template,
            &pairs(&[("rel-person", "\n  - \"Bob\""), ("birth", "2020-01-01")]),
            SubstitutionMode::Anchored,
        )
        .unwrap();
        assert_eq!(
            out.content,
            "---\nrel-person:\n  - \"Bob\"\nbirth: 2020-01-01\n---\n"
        );

        let out = substitute(
            "---\ntags:\n- a\n---\n",
            &pairs(&[("tags", "b")]),
            SubstitutionMode::Anchored,
        )
        .unwrap();
        assert_eq!(out.content, "---\ntags: b\n---\n");
    }

    #[test]
    fn test_list_block_value() {
        let out = substitute(
            "---\nrel-person:\n---\n",
            &pairs(&[("rel-person", "\n  - \"x\"\n  - \"y\"")]),
            SubstitutionMode::Anchored,
        )
        .unwrap();
        assert_eq!(out.content, "---\nrel-person:\n  - \"x\"\n  - \"y\"\n---\n");
    }

    #[test]
    fn test_unmatched_keys_reported() {
        let out = substitute("---\na:\n---\n", &pairs(&[("a", "1"), ("zz", "2")]), SubstitutionMode::Anchored).unwrap();
        assert_eq!(out.unmatched, vec!["zz"]);

        let out = substitute("no block", &pairs(&[("a", "1")]), SubstitutionMode::Anchored).unwrap();
        assert_eq!(out.content, "no block");
        assert_eq!(out.unmatched, vec!["a"]);
    }

    #[test]
    fn test_note_file_name() {
        assert_eq!(note_file_name(&pairs(&[("full_name", "Alice")])), "Alice.md");
        assert_eq!(note_file_name(&pairs(&[("full_name", "  ")])), "Untitled.md");
        assert_eq!(note_file_name(&pairs(&[("birth", "2020-01-01")])), "Untitled.md");
        assert_eq!(note_file_name(&pairs(&[("full_name", "A/B: C?")])), "A-B- C-.md");
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Global".parse::<SubstitutionMode>(), Ok(SubstitutionMode::Global));
        assert!("fuzzy".parse::<SubstitutionMode>().is_err());
    }
}
