//! Persisted entity and property configuration.
//!
//! The settings file is plain JSON with camelCase keys. A current file is
//! authoritative for every section it contains, so removed entity types and
//! mappings stay removed; sections it lacks come from the built-in defaults.
//! Within `entities`, an empty or missing field falls back to the default
//! config for that id.
//!
//! Files written by older releases carry no `version`. They are migrated on
//! load and layered over the defaults instead:
//!
//! - entity types: per id, file wins and new ids are added
//! - entity configs: per field, a non-empty file value wins
//! - property mappings: per key, file wins

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{EntityError, Result};
use super::property::{
    default_property_mappings, CitationConfig, PropertyMapping, PropertyMappings, PropertyType,
};

pub const SETTINGS_VERSION: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityConfig {
    pub note_path: String,
    pub template_path: String,
}

impl EntityConfig {
    /// Folder and template named after a display name.
    pub fn for_display_name(display_name: &str) -> Self {
        Self {
            note_path: display_name.to_string(),
            template_path: format!("_Templates/Temp-{}.md", display_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub version: u64,
    pub entity_types: BTreeMap<String, String>,
    pub entities: BTreeMap<String, EntityConfig>,
    pub property_mappings: PropertyMappings,
}

impl Default for Settings {
    fn default() -> Self {
        let defaults = [
            ("event", "Event", "Events", "_Templates/Temp-Event.md"),
            ("person", "Person", "Person", "_Templates/Temp-Person.md"),
            ("organization", "Organization", "Organization", "_Templates/Temp-Group.md"),
            ("location", "Location", "Location", "_Templates/Temp-Location.md"),
            ("country", "Country", "Country", "_Templates/Temp-Country.md"),
        ];

        let mut entity_types = BTreeMap::new();
        let mut entities = BTreeMap::new();
        for (id, display, note_path, template_path) in defaults {
            entity_types.insert(id.to_string(), display.to_string());
            entities.insert(
                id.to_string(),
                EntityConfig {
                    note_path: note_path.to_string(),
                    template_path: template_path.to_string(),
                },
            );
        }

        Self {
            version: SETTINGS_VERSION,
            entity_types,
            entities,
            property_mappings: default_property_mappings(),
        }
    }
}

/// What a settings file may contain, every section optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredSettings {
    entity_types: Option<BTreeMap<String, String>>,
    entities: Option<BTreeMap<String, StoredEntityConfig>>,
    property_mappings: Option<PropertyMappings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredEntityConfig {
    note_path: Option<String>,
    template_path: Option<String>,
}

impl Settings {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "settings file not found, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        let settings = Self::from_value(value)?;
        tracing::debug!(
            path = %path.display(),
            entity_types = settings.entity_types.len(),
            mappings = settings.property_mappings.len(),
            "loaded settings"
        );
        Ok(settings)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let version = value.get("version").and_then(Value::as_u64).unwrap_or(0);
        let (stored, layered) = match version {
            0 => (migrate_v0(value)?, true),
            SETTINGS_VERSION => (serde_json::from_value(value)?, false),
            v => {
                return Err(EntityError::InvalidSetting(format!(
                    "unsupported settings version {} (newest known is {})",
                    v, SETTINGS_VERSION
                )))
            }
        };
        Ok(Self::default().merged(stored, layered))
    }

    /// Combine `stored` with these defaults. `layered` keeps every default id
    /// the file does not mention; otherwise a section present in the file
    /// replaces the default section.
    fn merged(self, stored: StoredSettings, layered: bool) -> Self {
        let Settings {
            version,
            entity_types: default_types,
            entities: default_entities,
            property_mappings: default_mappings,
        } = self;

        let entity_types = overlay(default_types, stored.entity_types, layered);

        let mut entities = if layered || stored.entities.is_none() {
            default_entities.clone()
        } else {
            BTreeMap::new()
        };
        for (id, cfg) in stored.entities.unwrap_or_default() {
            let entry = entities.entry(id).or_insert_with_key(|id| {
                default_entities.get(id).cloned().unwrap_or_else(|| {
                    let display = entity_types
                        .get(id)
                        .map(String::as_str)
                        .filter(|name| !name.is_empty())
                        .unwrap_or(id.as_str());
                    EntityConfig::for_display_name(display)
                })
            });
            if let Some(note_path) = cfg.note_path.filter(|p| !p.is_empty()) {
                entry.note_path = note_path;
            }
            if let Some(template_path) = cfg.template_path.filter(|p| !p.is_empty()) {
                entry.template_path = template_path;
            }
        }
        for id in entity_types.keys() {
            if !entities.contains_key(id) {
                if let Some(config) = default_entities.get(id) {
                    entities.insert(id.clone(), config.clone());
                }
            }
        }

        Self {
            version,
            entity_types,
            entities,
            property_mappings: overlay(default_mappings, stored.property_mappings, layered),
        }
    }

    /// Write the whole settings object as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")?;
        tracing::debug!(path = %path.display(), "saved settings");
        Ok(())
    }

    // ===== Entity types =====

    pub fn entity_types(&self) -> Vec<(&str, &str)> {
        self.entity_types
            .iter()
            .map(|(id, name)| (id.as_str(), name.as_str()))
            .collect()
    }

    pub fn has_entity_type(&self, id: &str) -> bool {
        self.entity_types.contains_key(id)
    }

    pub fn entity_display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.entity_types
            .get(id)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(id)
    }

    pub fn entity_config(&self, id: &str) -> Option<&EntityConfig> {
        self.entities.get(id)
    }

    /// Register a type whose folder and template follow its display name.
    pub fn add_entity_type(&mut self, id: &str, display_name: &str) -> Result<()> {
        let id = non_empty(id, "entity type id")?;
        let display_name = non_empty(display_name, "display name")?;
        self.entity_types
            .insert(id.to_string(), display_name.to_string());
        self.entities
            .insert(id.to_string(), EntityConfig::for_display_name(display_name));
        Ok(())
    }

    pub fn delete_entity_type(&mut self, id: &str) -> Result<()> {
        if self.entity_types.remove(id).is_none() {
            return Err(EntityError::UnknownEntityType(id.to_string()));
        }
        self.entities.remove(id);
        Ok(())
    }

    pub fn rename_entity_type(&mut self, id: &str, display_name: &str) -> Result<()> {
        let display_name = non_empty(display_name, "display name")?;
        let entry = self
            .entity_types
            .get_mut(id)
            .ok_or_else(|| EntityError::UnknownEntityType(id.to_string()))?;
        *entry = display_name.to_string();
        Ok(())
    }

    pub fn set_entity_paths(
        &mut self,
        id: &str,
        note_path: Option<&str>,
        template_path: Option<&str>,
    ) -> Result<&EntityConfig> {
        if !self.has_entity_type(id) {
            return Err(EntityError::UnknownEntityType(id.to_string()));
        }
        let display = self.entity_display_name(id).to_string();
        let config = self
            .entities
            .entry(id.to_string())
            .or_insert_with(|| EntityConfig::for_display_name(&display));
        if let Some(path) = note_path {
            config.note_path = path.trim().to_string();
        }
        if let Some(path) = template_path {
            config.template_path = non_empty(path, "template path")?.to_string();
        }
        Ok(&*config)
    }

    // ===== Property mappings =====

    pub fn property_mapping(&self, key: &str) -> Option<&PropertyMapping> {
        self.property_mappings.get(key)
    }

    pub fn set_property_mapping(&mut self, key: &str, mapping: PropertyMapping) -> Result<()> {
        let key = non_empty(key, "property name")?;
        if key.contains(':') {
            return Err(EntityError::InvalidSetting(format!(
                "property name '{}' may not contain ':'",
                key
            )));
        }
        self.property_mappings.insert(key.to_string(), mapping);
        Ok(())
    }

    pub fn remove_property_mapping(&mut self, key: &str) -> Option<PropertyMapping> {
        self.property_mappings.remove(key)
    }

    /// Mapping for `key`, created as a `Text` field labelled by the key if absent.
    fn mapping_mut(&mut self, key: &str) -> Result<&mut PropertyMapping> {
        let key = non_empty(key, "property name")?;
        if !self.property_mappings.contains_key(key) {
            self.set_property_mapping(key, PropertyMapping::text(key))?;
        }
        self.property_mappings
            .get_mut(key)
            .ok_or_else(|| EntityError::InvalidSetting(format!("no mapping for '{}'", key)))
    }

    pub fn set_property_type(&mut self, key: &str, property_type: PropertyType) -> Result<()> {
        self.mapping_mut(key)?.set_type(property_type);
        Ok(())
    }

    pub fn set_display_name(&mut self, key: &str, display_name: &str) -> Result<()> {
        self.mapping_mut(key)?.display_name = display_name.trim().to_string();
        Ok(())
    }

    pub fn set_enum_options(&mut self, key: &str, options: Vec<String>) -> Result<()> {
        let options = options
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        self.mapping_mut(key)?.enum_options = Some(options);
        Ok(())
    }

    pub fn set_citation_config(
        &mut self,
        key: &str,
        property_name: Option<&str>,
        property_value: Option<&str>,
    ) -> Result<()> {
        let mapping = self.mapping_mut(key)?;
        let config = mapping
            .citation_config
            .get_or_insert_with(CitationConfig::default);
        if let Some(name) = property_name {
            config.property_name = name.trim().to_string();
        }
        if let Some(value) = property_value {
            config.property_value = value.trim().to_string();
        }
        Ok(())
    }
}

fn overlay<V>(
    defaults: BTreeMap<String, V>,
    stored: Option<BTreeMap<String, V>>,
    layered: bool,
) -> BTreeMap<String, V> {
    match stored {
        None => defaults,
        Some(stored) if !layered => stored,
        Some(stored) => {
            let mut merged = defaults;
            merged.extend(stored);
            merged
        }
    }
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(EntityError::InvalidSetting(format!("{} must not be empty", what)))
    } else {
        Ok(value)
    }
}

/// Unversioned files: the single-entity layout (`eventNotePath`,
/// `templatePath`, label-only mappings) and per-entity mapping tables.
fn migrate_v0(value: Value) -> Result<StoredSettings> {
    let mut entity_types = BTreeMap::new();
    let mut entities = BTreeMap::new();
    let mut mappings = PropertyMappings::new();
    let Value::Object(root) = value else {
        return Err(EntityError::InvalidSetting(
            "settings file must hold a JSON object".to_string(),
        ));
    };

    if let Some(Value::Object(types)) = root.get("entityTypes") {
        for (id, name) in types {
            if let Some(name) = name.as_str() {
                entity_types.insert(id.clone(), name.to_string());
            }
        }
    }

    let legacy_note = root.get("eventNotePath").and_then(Value::as_str);
    let legacy_template = root.get("templatePath").and_then(Value::as_str);
    if legacy_note.is_some() || legacy_template.is_some() {
        entities.insert(
            "event".to_string(),
            StoredEntityConfig {
                note_path: legacy_note.map(String::from),
                template_path: legacy_template.map(String::from),
            },
        );
    }

    if let Some(Value::Object(stored_entities)) = root.get("entities") {
        for (id, cfg) in stored_entities {
            entities.insert(
                id.clone(),
                StoredEntityConfig {
                    note_path: cfg.get("notePath").and_then(Value::as_str).map(String::from),
                    template_path: cfg
                        .get("templatePath")
                        .and_then(Value::as_str)
                        .map(String::from),
                },
            );
            if let Some(nested) = cfg.get("propertyMappings") {
                migrate_mappings(nested, &mut mappings);
            }
        }
    }

    if let Some(flat) = root.get("propertyMappings") {
        migrate_mappings(flat, &mut mappings);
    }

    tracing::info!("migrated unversioned settings");
    Ok(StoredSettings {
        entity_types: Some(entity_types),
        entities: Some(entities),
        property_mappings: Some(mappings),
    })
}

fn migrate_mappings(value: &Value, into: &mut PropertyMappings) {
    let Value::Object(map) = value else {
        return;
    };
    for (key, mapping) in map {
        match mapping {
            Value::String(label) => {
                into.insert(key.clone(), PropertyMapping::text(label.as_str()));
            }
            other => match serde_json::from_value::<PropertyMapping>(other.clone()) {
                Ok(mapping) => {
                    into.insert(key.clone(), mapping);
                }
                Err(e) => tracing::warn!(key = %key, error = %e, "skipping unreadable property mapping"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.entity_types.len(), 5);
        assert_eq!(
            settings.entity_config("organization").unwrap().template_path,
            "_Templates/Temp-Group.md"
        );
        assert_eq!(settings.entity_config("event").unwrap().note_path, "Events");
        assert_eq!(
            settings.property_mapping("birth").unwrap().property_type,
            PropertyType::Date
        );
    }

    #[test]
    fn test_stored_sections_replace_defaults() {
        let settings = Settings::from_value(json!({
            "version": 1,
            "entityTypes": { "event": "Happening", "book": "Book" },
            "entities": {
                "event": { "notePath": "", "templatePath": "T/Event.md" },
                "book": { "notePath": "Library" }
            }
        }))
        .unwrap();

        assert_eq!(settings.entity_display_name("event"), "Happening");
        assert!(!settings.has_entity_type("person"));
        assert!(settings.entity_config("person").is_none());

        let event = settings.entity_config("event").unwrap();
        assert_eq!(event.note_path, "Events");
        assert_eq!(event.template_path, "T/Event.md");

        let book = settings.entity_config("book").unwrap();
        assert_eq!(book.note_path, "Library");
        assert_eq!(book.template_path, "_Templates/Temp-Book.md");

        // no propertyMappings section: defaults apply
        assert_eq!(settings.property_mapping("code").unwrap().display_name, "代码");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let settings = Settings::from_value(json!({
            "version": 1,
            "propertyMappings": {
                "gender": { "displayName": "Gender", "type": "Enum", "enumOptions": ["f", "m"] }
            }
        }))
        .unwrap();

        assert_eq!(settings.entity_types, Settings::default().entity_types);
        assert_eq!(settings.entities, Settings::default().entities);
        assert_eq!(settings.property_mappings.len(), 1);
        assert_eq!(
            settings.property_mapping("gender").unwrap().property_type,
            PropertyType::Enum
        );
    }

    #[test]
    fn test_removals_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.delete_entity_type("country").unwrap();
        assert!(settings.remove_property_mapping("gender").is_some());
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert!(!loaded.has_entity_type("country"));
        assert!(loaded.entity_config("country").is_none());
        assert!(loaded.property_mapping("gender").is_none());
        assert!(loaded.has_entity_type("person"));
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_migrates_single_entity_layout() {
        let settings = Settings::from_value(json!({
            "eventNotePath": "Diary/Events",
            "templatePath": "_T/Event.md",
            "propertyMappings": { "full_name": "Headline", "venue": "Venue" }
        }))
        .unwrap();

        let event = settings.entity_config("event").unwrap();
        assert_eq!(event.note_path, "Diary/Events");
        assert_eq!(event.template_path, "_T/Event.md");
        assert_eq!(settings.property_mapping("full_name").unwrap().display_name, "Headline");
        assert_eq!(
            settings.property_mapping("venue").unwrap().property_type,
            PropertyType::Text
        );
        assert_eq!(settings.version, SETTINGS_VERSION);
    }

    #[test]
    fn test_migrates_nested_entity_mappings() {
        let settings = Settings::from_value(json!({
            "entities": {
                "person": {
                    "notePath": "People",
                    "propertyMappings": { "nickname": { "displayName": "Nick", "type": "Text" } }
                }
            }
        }))
        .unwrap();
        assert_eq!(settings.entity_config("person").unwrap().note_path, "People");
        assert_eq!(settings.property_mapping("nickname").unwrap().display_name, "Nick");
    }

    #[test]
    fn test_rejects_future_version() {
        let err = Settings::from_value(json!({ "version": 99 })).unwrap_err();
        assert!(matches!(err, EntityError::InvalidSetting(_)));
    }

    #[test]
    fn test_entity_type_management() {
        let mut settings = Settings::default();
        settings.add_entity_type("book", "Book").unwrap();
        assert!(settings.has_entity_type("book"));
        assert_eq!(
            settings.entity_config("book").unwrap(),
            &EntityConfig {
                note_path: "Book".to_string(),
                template_path: "_Templates/Temp-Book.md".to_string(),
            }
        );

        settings.rename_entity_type("book", "Novel").unwrap();
        assert_eq!(settings.entity_display_name("book"), "Novel");

        settings.delete_entity_type("book").unwrap();
        assert!(!settings.has_entity_type("book"));
        assert!(settings.entity_config("book").is_none());
        assert!(matches!(
            settings.delete_entity_type("book"),
            Err(EntityError::UnknownEntityType(_))
        ));
        assert!(settings.add_entity_type(" ", "Blank").is_err());
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let settings = Settings::default();
        assert_eq!(settings.entity_display_name("spaceship"), "spaceship");
    }

    #[test]
    fn test_property_mapping_editing() {
        let mut settings = Settings::default();
        settings.set_property_type("status", PropertyType::Enum).unwrap();
        settings
            .set_enum_options("status", vec!["open".into(), " ".into(), "closed".into()])
            .unwrap();
        let status = settings.property_mapping("status").unwrap();
        assert_eq!(status.display_name, "status");
        assert_eq!(status.options(), ["open", "closed"]);

        settings
            .set_citation_config("rel-event", None, Some("event"))
            .unwrap();
        let cite = settings.property_mapping("rel-event").unwrap();
        let config = cite.citation_config.as_ref().unwrap();
        assert_eq!(config.property_name, "entity-type");
        assert_eq!(config.property_value, "event");

        assert!(settings.remove_property_mapping("status").is_some());
        assert!(settings
            .set_property_mapping("bad:key", PropertyMapping::text("x"))
            .is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.json");

        let mut settings = Settings::default();
        settings.add_entity_type("book", "Book").unwrap();
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, Settings::default());
    }
}
