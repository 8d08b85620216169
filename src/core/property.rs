use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::frontmatter::ENTITY_TYPE_KEY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Checkbox,
    Citation,
    Date,
    #[serde(rename = "Date & time")]
    DateTime,
    Enum,
    List,
    Number,
    Text,
}

impl PropertyType {
    pub const ALL: [PropertyType; 8] = [
        Self::Checkbox,
        Self::Citation,
        Self::Date,
        Self::DateTime,
        Self::Enum,
        Self::List,
        Self::Number,
        Self::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checkbox => "Checkbox",
            Self::Citation => "Citation",
            Self::Date => "Date",
            Self::DateTime => "Date & time",
            Self::Enum => "Enum",
            Self::List => "List",
            Self::Number => "Number",
            Self::Text => "Text",
        }
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Self::List | Self::Citation)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(t) = Self::ALL.iter().find(|t| t.as_str() == s) {
            return Ok(*t);
        }
        match s.to_ascii_lowercase().as_str() {
            "checkbox" => Ok(Self::Checkbox),
            "citation" => Ok(Self::Citation),
            "date" => Ok(Self::Date),
            "datetime" | "date-time" | "date & time" => Ok(Self::DateTime),
            "enum" => Ok(Self::Enum),
            "list" => Ok(Self::List),
            "number" => Ok(Self::Number),
            "text" => Ok(Self::Text),
            _ => Err(format!(
                "unknown property type '{}' (expected one of: {})",
                s,
                Self::ALL
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// Which notes a citation field may reference, e.g. `entity-type: event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationConfig {
    pub property_name: String,
    pub property_value: String,
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            property_name: ENTITY_TYPE_KEY.to_string(),
            property_value: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMapping {
    pub display_name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_config: Option<CitationConfig>,
}

impl PropertyMapping {
    /// A mapping with the option block its type needs already in place.
    pub fn new(property_type: PropertyType, display_name: impl Into<String>) -> Self {
        let mut mapping = Self {
            display_name: display_name.into(),
            property_type: PropertyType::Text,
            enum_options: None,
            citation_config: None,
        };
        mapping.set_type(property_type);
        mapping
    }

    pub fn text(display_name: impl Into<String>) -> Self {
        Self::new(PropertyType::Text, display_name)
    }

    /// Switch type, initializing enum options or citation config when absent.
    pub fn set_type(&mut self, property_type: PropertyType) {
        self.property_type = property_type;
        match property_type {
            PropertyType::Enum if self.enum_options.is_none() => {
                self.enum_options = Some(Vec::new());
            }
            PropertyType::Citation if self.citation_config.is_none() => {
                self.citation_config = Some(CitationConfig::default());
            }
            _ => {}
        }
    }

    pub fn options(&self) -> &[String] {
        self.enum_options.as_deref().unwrap_or(&[])
    }
}

pub type PropertyMappings = BTreeMap<String, PropertyMapping>;

pub fn default_property_mappings() -> PropertyMappings {
    [
        ("full_name", PropertyMapping::text("名称")),
        ("rel-group", PropertyMapping::text("关联组织")),
        ("rel-person", PropertyMapping::text("关联人员")),
        ("rel-event", PropertyMapping::text("关联事件")),
        ("rel-location", PropertyMapping::text("关联地点")),
        ("rel-country", PropertyMapping::text("关联国家")),
        ("birth", PropertyMapping::new(PropertyType::Date, "出生日期")),
        ("gender", PropertyMapping::text("性别")),
        ("code", PropertyMapping::text("代码")),
        ("description", PropertyMapping::text("描述")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Label for a property, falling back to the key itself.
pub fn display_name<'a>(property: &'a str, mappings: &'a PropertyMappings) -> &'a str {
    mappings
        .get(property)
        .map(|m| m.display_name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(property)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names_match_data_file() {
        let json = serde_json::to_string(&PropertyType::DateTime).unwrap();
        assert_eq!(json, "\"Date & time\"");

        let mapping: PropertyMapping = serde_json::from_str(
            r#"{"displayName":"Kind","type":"Enum","enumOptions":["a","b"]}"#,
        )
        .unwrap();
        assert_eq!(mapping.property_type, PropertyType::Enum);
        assert_eq!(mapping.options(), ["a", "b"]);
    }

    #[test]
    fn test_parse_type_names() {
        assert_eq!("Date & time".parse::<PropertyType>(), Ok(PropertyType::DateTime));
        assert_eq!("datetime".parse::<PropertyType>(), Ok(PropertyType::DateTime));
        assert_eq!("list".parse::<PropertyType>(), Ok(PropertyType::List));
        assert!("Colour".parse::<PropertyType>().is_err());
    }

    #[test]
    fn test_new_mapping_initializes_options() {
        let enum_mapping = PropertyMapping::new(PropertyType::Enum, "Kind");
        assert_eq!(enum_mapping.enum_options, Some(vec![]));

        let citation = PropertyMapping::new(PropertyType::Citation, "Event");
        assert_eq!(citation.citation_config, Some(CitationConfig::default()));
        assert_eq!(citation.citation_config.unwrap().property_name, "entity-type");

        assert!(PropertyMapping::text("Name").enum_options.is_none());
    }

    #[test]
    fn test_set_type_keeps_existing_options() {
        let mut mapping = PropertyMapping::new(PropertyType::Enum, "Kind");
        mapping.enum_options = Some(vec!["x".to_string()]);
        mapping.set_type(PropertyType::Text);
        mapping.set_type(PropertyType::Enum);
        assert_eq!(mapping.options(), ["x"]);
    }

    #[test]
    fn test_display_name_fallback() {
        let mappings = default_property_mappings();
        assert_eq!(display_name("birth", &mappings), "出生日期");
        assert_eq!(display_name("nickname", &mappings), "nickname");
    }
}
