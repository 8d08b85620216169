//! Typed property values and their text form inside a note.

use chrono::{NaiveDate, NaiveDateTime};

use super::error::{EntityError, Result};
use super::property::PropertyType;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Checkbox(bool),
    Citation(Vec<String>),
    Date(String),
    DateTime(String),
    Enum(String),
    List(Vec<String>),
    Number(String),
    Text(String),
}

impl PropertyValue {
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Checkbox(_) => PropertyType::Checkbox,
            Self::Citation(_) => PropertyType::Citation,
            Self::Date(_) => PropertyType::Date,
            Self::DateTime(_) => PropertyType::DateTime,
            Self::Enum(_) => PropertyType::Enum,
            Self::List(_) => PropertyType::List,
            Self::Number(_) => PropertyType::Number,
            Self::Text(_) => PropertyType::Text,
        }
    }

    /// Empty value for a type: unchecked, no entries, or blank text.
    pub fn empty(property_type: PropertyType) -> Self {
        match property_type {
            PropertyType::Checkbox => Self::Checkbox(false),
            PropertyType::Citation => Self::Citation(Vec::new()),
            PropertyType::Date => Self::Date(String::new()),
            PropertyType::DateTime => Self::DateTime(String::new()),
            PropertyType::Enum => Self::Enum(String::new()),
            PropertyType::List => Self::List(Vec::new()),
            PropertyType::Number => Self::Number(String::new()),
            PropertyType::Text => Self::Text(String::new()),
        }
    }

    /// Build a value from raw user inputs for `property`.
    ///
    /// Multi-valued types take every input; scalar types take the last one.
    pub fn capture(
        property: &str,
        property_type: PropertyType,
        inputs: &[String],
        enum_options: &[String],
    ) -> Result<Self> {
        // A line break would end the `key:` line and let the rest land as
        // new front matter.
        if let Some(bad) = inputs
            .iter()
            .map(|s| s.trim())
            .find(|s| s.contains(|c: char| c == '\n' || c == '\r'))
        {
            return Err(EntityError::invalid_value(
                property,
                format!("'{}' spans more than one line", bad.escape_debug()),
            ));
        }

        let raw = inputs.last().map(|s| s.trim()).unwrap_or("");

        let value = match property_type {
            PropertyType::List => Self::List(collect_inputs(inputs)),
            PropertyType::Citation => Self::Citation(collect_inputs(inputs)),
            _ if raw.is_empty() => Self::empty(property_type),
            PropertyType::Checkbox => Self::Checkbox(parse_bool(property, raw)?),
            PropertyType::Number => {
                if !raw.parse::<f64>().map(f64::is_finite).unwrap_or(false) {
                    return Err(EntityError::invalid_value(
                        property,
                        format!("'{}' is not a number", raw),
                    ));
                }
                Self::Number(raw.to_string())
            }
            PropertyType::Date => {
                NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                    EntityError::invalid_value(property, format!("'{}' is not a YYYY-MM-DD date", raw))
                })?;
                Self::Date(raw.to_string())
            }
            PropertyType::DateTime => {
                let valid = DATETIME_FORMATS
                    .iter()
                    .any(|fmt| NaiveDateTime::parse_from_str(raw, fmt).is_ok());
                if !valid {
                    return Err(EntityError::invalid_value(
                        property,
                        format!("'{}' is not a YYYY-MM-DDTHH:MM date and time", raw),
                    ));
                }
                Self::DateTime(raw.to_string())
            }
            PropertyType::Enum => {
                if !enum_options.is_empty() && !enum_options.iter().any(|o| o == raw) {
                    return Err(EntityError::invalid_value(
                        property,
                        format!("'{}' is not one of: {}", raw, enum_options.join(", ")),
                    ));
                }
                Self::Enum(raw.to_string())
            }
            PropertyType::Text => Self::Text(raw.to_string()),
        };
        Ok(value)
    }

    /// Text written after `key:` in the note.
    pub fn format(&self) -> String {
        match self {
            Self::Checkbox(checked) => if *checked { "true" } else { "false" }.to_string(),
            Self::List(values) => bullet_block(values.iter().map(|v| format!("\"{}\"", v))),
            Self::Citation(values) => bullet_block(values.iter().map(|v| format!("\"[[{}]]\"", v))),
            Self::Date(s)
            | Self::DateTime(s)
            | Self::Enum(s)
            | Self::Number(s)
            | Self::Text(s) => s.clone(),
        }
    }

    /// Inverse of [`format`](Self::format) for a value read back from a note.
    pub fn parse_formatted(property_type: PropertyType, text: &str) -> Self {
        match property_type {
            PropertyType::Checkbox => Self::Checkbox(text.trim() == "true"),
            PropertyType::List => Self::List(parse_bullets(text).collect()),
            PropertyType::Citation => Self::Citation(
                parse_bullets(text)
                    .map(|v| {
                        v.strip_prefix("[[")
                            .and_then(|v| v.strip_suffix("]]"))
                            .map(String::from)
                            .unwrap_or(v)
                    })
                    .collect(),
            ),
            PropertyType::Date => Self::Date(text.trim().to_string()),
            PropertyType::DateTime => Self::DateTime(text.trim().to_string()),
            PropertyType::Enum => Self::Enum(text.trim().to_string()),
            PropertyType::Number => Self::Number(text.trim().to_string()),
            PropertyType::Text => Self::Text(text.trim().to_string()),
        }
    }
}

fn collect_inputs(inputs: &[String]) -> Vec<String> {
    inputs
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn bullet_block(items: impl Iterator<Item = String>) -> String {
    let lines: Vec<String> = items.map(|item| format!("  - {}", item)).collect();
    if lines.is_empty() {
        String::new()
    } else {
        format!("\n{}", lines.join("\n"))
    }
}

fn parse_bullets(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('-'))
        .map(|item| unquote(item.trim()).to_string())
        .filter(|item| !item.is_empty())
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}

fn parse_bool(property: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(EntityError::invalid_value(
            property,
            format!("'{}' is not a checkbox value (true/false)", raw),
        )),
    }
}
