use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EntityError>;

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("No configuration found for entity type: {0}")]
    MissingEntityConfig(String),

    #[error("Template file not found: {0}")]
    TemplateNotFound(String),

    #[error("No properties found in template: {0}")]
    NoProperties(String),

    #[error("Invalid value for '{property}': {reason}")]
    InvalidValue { property: String, reason: String },

    #[error("Property '{property}' is not part of the {entity_type} template")]
    UnknownProperty {
        property: String,
        entity_type: String,
    },

    #[error("Note already exists: {}", .0.display())]
    NoteExists(PathBuf),

    #[error("Path escapes the vault: {0}")]
    InvalidPath(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Settings JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid key pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl EntityError {
    pub fn invalid_value(property: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            property: property.to_string(),
            reason: reason.into(),
        }
    }
}
