use std::path::PathBuf;

use serde::Serialize;

use super::error::{EntityError, Result};
use super::form::{Form, FormValues};
use super::frontmatter::template_properties;
use super::settings::{EntityConfig, Settings};
use super::template::{note_file_name, substitute, SubstitutionMode};
use super::vault::Vault;

#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOptions {
    pub mode: SubstitutionMode,
    pub overwrite: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedNote {
    pub entity_type: String,
    /// Vault-relative path of the note.
    pub path: String,
    #[serde(skip)]
    pub absolute_path: PathBuf,
    pub content: String,
    pub unmatched: Vec<String>,
    pub written: bool,
}

pub struct EntityCreator {
    vault: Vault,
    settings: Settings,
}

impl EntityCreator {
    pub fn new(vault: Vault, settings: Settings) -> Self {
        Self { vault, settings }
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn config(&self, entity_type: &str) -> Result<&EntityConfig> {
        if !self.settings.has_entity_type(entity_type) {
            return Err(EntityError::UnknownEntityType(entity_type.to_string()));
        }
        self.settings
            .entity_config(entity_type)
            .ok_or_else(|| EntityError::MissingEntityConfig(entity_type.to_string()))
    }

    fn read_template(&self, config: &EntityConfig) -> Result<String> {
        if !self.vault.is_file(&config.template_path) {
            return Err(EntityError::TemplateNotFound(config.template_path.clone()));
        }
        self.vault.read(&config.template_path)
    }

    /// Scan the entity's template and lay out one field per property.
    pub fn open_form(&self, entity_type: &str) -> Result<Form> {
        let config = self.config(entity_type)?;
        let template = self.read_template(config)?;
        let properties = template_properties(&template);
        if properties.is_empty() {
            return Err(EntityError::NoProperties(config.template_path.clone()));
        }
        tracing::debug!(
            entity_type,
            template = %config.template_path,
            properties = properties.len(),
            "opened form"
        );

        Ok(Form::build(
            entity_type,
            self.settings.entity_display_name(entity_type),
            &config.template_path,
            &properties,
            &self.settings.property_mappings,
        ))
    }

    /// Render the template with `values` and write it into the entity folder.
    pub fn create_note(
        &self,
        entity_type: &str,
        values: &FormValues,
        options: CreateOptions,
    ) -> Result<CreatedNote> {
        self.try_create_note(entity_type, values, options)
            .inspect_err(|e| {
                tracing::error!(entity_type, error = %e, "failed to create note");
            })
    }

    fn try_create_note(
        &self,
        entity_type: &str,
        values: &FormValues,
        options: CreateOptions,
    ) -> Result<CreatedNote> {
        let config = self.config(entity_type)?;
        let template = self.read_template(config)?;

        let formatted = values.formatted();
        let rendered = substitute(&template, &formatted, options.mode)?;

        let folder = config.note_path.trim_matches('/');
        let file_name = note_file_name(&formatted);
        let rel_path = if folder.is_empty() {
            file_name
        } else {
            format!("{}/{}", folder, file_name)
        };
        let absolute_path = self.vault.resolve(&rel_path)?;

        if options.dry_run {
            tracing::info!(path = %rel_path, "dry run, note not written");
            return Ok(CreatedNote {
                entity_type: entity_type.to_string(),
                path: rel_path,
                absolute_path,
                content: rendered.content,
                unmatched: rendered.unmatched,
                written: false,
            });
        }

        if !folder.is_empty() && !self.vault.exists(folder) {
            tracing::info!(folder, "creating folder");
            self.vault.create_folder(folder)?;
        }

        tracing::info!(path = %rel_path, "creating note");
        let absolute_path = self
            .vault
            .create(&rel_path, &rendered.content, options.overwrite)?;
        tracing::info!(path = %rel_path, "note created");

        Ok(CreatedNote {
            entity_type: entity_type.to_string(),
            path: rel_path,
            absolute_path,
            content: rendered.content,
            unmatched: rendered.unmatched,
            written: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::property::{PropertyMapping, PropertyType};

    fn inputs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn vault_with_template(template: &str) -> (tempfile::TempDir, EntityCreator) {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path());
        vault.create_folder("_Templates").unwrap();
        vault
            .create("_Templates/Temp-Person.md", template, false)
            .unwrap();
        let creator = EntityCreator::new(vault, Settings::default());
        (dir, creator)
    }

    #[test]
    fn test_end_to_end_person() {
        let (_dir, creator) = vault_with_template("---\nfull_name:\nbirth:\n---\n");
        let form = creator.open_form("person").unwrap();
        let values = form
            .submit(&inputs(&[("full_name", "Alice"), ("birth", "2020-01-01")]))
            .unwrap();

        let note = creator
            .create_note("person", &values, CreateOptions::default())
            .unwrap();
        assert_eq!(note.path, "Person/Alice.md");
        assert!(note.written);

        let written = creator.vault().read("Person/Alice.md").unwrap();
        assert!(written.contains("full_name: Alice"));
        assert!(written.contains("birth: 2020-01-01"));
        assert_eq!(written, "---\nfull_name: Alice\nbirth: 2020-01-01\n---\n");
    }

    #[test]
    fn test_entity_type_key_is_kept_verbatim() {
        let (_dir, creator) =
            vault_with_template("---\nentity-type: person\nfull_name:\n---\n# Bio\n");
        let form = creator.open_form("person").unwrap();
        assert_eq!(form.fields.len(), 1);

        let values = form.submit(&inputs(&[("full_name", "Bob")])).unwrap();
        let note = creator
            .create_note("person", &values, CreateOptions::default())
            .unwrap();
        assert_eq!(note.content, "---\nentity-type: person\nfull_name: Bob\n---\n# Bio\n");
    }

    #[test]
    fn test_blank_fields_keep_template_defaults() {
        let (_dir, creator) = vault_with_template("---\nfull_name:\ngender: unknown\n---\n");
        let values = creator
            .open_form("person")
            .unwrap()
            .submit(&inputs(&[("full_name", "Alice")]))
            .unwrap();
        let note = creator
            .create_note("person", &values, CreateOptions::default())
            .unwrap();
        assert_eq!(note.content, "---\nfull_name: Alice\ngender: unknown\n---\n");
    }

    #[test]
    fn test_untitled_when_name_missing() {
        let (_dir, creator) = vault_with_template("---\nfull_name:\ncode:\n---\n");
        let values = creator
            .open_form("person")
            .unwrap()
            .submit(&inputs(&[("code", "X1")]))
            .unwrap();
        let note = creator
            .create_note("person", &values, CreateOptions::default())
            .unwrap();
        assert_eq!(note.path, "Person/Untitled.md");

        let again = creator.create_note("person", &values, CreateOptions::default());
        assert!(matches!(again, Err(EntityError::NoteExists(_))));

        let overwrite = CreateOptions {
            overwrite: true,
            ..CreateOptions::default()
        };
        assert!(creator.create_note("person", &values, overwrite).is_ok());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let (_dir, creator) = vault_with_template("---\nfull_name:\n---\n");
        let values = creator
            .open_form("person")
            .unwrap()
            .submit(&inputs(&[("full_name", "Dana")]))
            .unwrap();
        let options = CreateOptions {
            dry_run: true,
            ..CreateOptions::default()
        };
        let note = creator.create_note("person", &values, options).unwrap();
        assert!(!note.written);
        assert_eq!(note.content, "---\nfull_name: Dana\n---\n");
        assert!(!creator.vault().exists("Person"));
    }

    #[test]
    fn test_open_form_errors() {
        let (_dir, creator) = vault_with_template("# no front matter\n");
        assert!(matches!(
            creator.open_form("person"),
            Err(EntityError::NoProperties(_))
        ));
        assert!(matches!(
            creator.open_form("event"),
            Err(EntityError::TemplateNotFound(_))
        ));
        assert!(matches!(
            creator.open_form("spaceship"),
            Err(EntityError::UnknownEntityType(_))
        ));
    }

    #[test]
    fn test_missing_entity_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.entities.remove("country");
        let creator = EntityCreator::new(Vault::open(dir.path()), settings);
        assert!(matches!(
            creator.open_form("country"),
            Err(EntityError::MissingEntityConfig(_))
        ));
    }

    #[test]
    fn test_citation_and_list_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path());
        vault.create_folder("_Templates").unwrap();
        vault
            .create(
                "_Templates/Temp-Event.md",
                "---\nfull_name:\nrel-event:\nrel-person:\n---\n",
                false,
            )
            .unwrap();

        let mut settings = Settings::default();
        settings
            .set_property_mapping(
                "rel-person",
                PropertyMapping::new(PropertyType::List, "People"),
            )
            .unwrap();
        settings
            .set_property_type("rel-event", PropertyType::Citation)
            .unwrap();

        let creator = EntityCreator::new(vault, settings);
        let values = creator
            .open_form("event")
            .unwrap()
            .submit(&inputs(&[
                ("full_name", "Launch"),
                ("rel-event", "Kickoff"),
                ("rel-person", "Ada"),
            ]))
            .unwrap();
        let note = creator
            .create_note("event", &values, CreateOptions::default())
            .unwrap();

        assert_eq!(note.path, "Events/Launch.md");
        assert_eq!(
            note.content,
            "---\nfull_name: Launch\nrel-event:\n  - \"[[Kickoff]]\"\nrel-person:\n  - \"Ada\"\n---\n"
        );
    }
}
