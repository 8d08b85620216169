use serde::Serialize;

use super::error::{EntityError, Result};
use super::property::{display_name, CitationConfig, PropertyMappings, PropertyType};
use super::value::PropertyValue;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub property: String,
    pub display_name: String,
    pub property_type: PropertyType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<CitationConfig>,
}

/// Creation form for one entity type, one field per template property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Form {
    pub entity_type: String,
    pub title: String,
    pub template_path: String,
    pub fields: Vec<FormField>,
}

impl Form {
    pub fn build(
        entity_type: &str,
        entity_display: &str,
        template_path: &str,
        properties: &[String],
        mappings: &PropertyMappings,
    ) -> Self {
        let fields = properties
            .iter()
            .map(|property| {
                let mapping = mappings.get(property);
                let property_type = mapping
                    .map(|m| m.property_type)
                    .unwrap_or(PropertyType::Text);
                FormField {
                    property: property.clone(),
                    display_name: display_name(property, mappings).to_string(),
                    property_type,
                    enum_options: mapping.map(|m| m.options().to_vec()).unwrap_or_default(),
                    citation: mapping
                        .filter(|_| property_type == PropertyType::Citation)
                        .map(|m| m.citation_config.clone().unwrap_or_default()),
                }
            })
            .collect();

        Self {
            entity_type: entity_type.to_string(),
            title: format!("Create Entity-{}", entity_display),
            template_path: template_path.to_string(),
            fields,
        }
    }

    pub fn field(&self, property: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.property == property)
    }

    /// Capture a typed value for every field from `(property, raw)` inputs.
    ///
    /// Repeated properties collect into one list; fields with no input get
    /// their type's empty value.
    pub fn submit(&self, inputs: &[(String, String)]) -> Result<FormValues> {
        if let Some((property, _)) = inputs.iter().find(|(p, _)| self.field(p).is_none()) {
            return Err(EntityError::UnknownProperty {
                property: property.clone(),
                entity_type: self.entity_type.clone(),
            });
        }

        let mut entries = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let raw: Vec<String> = inputs
                .iter()
                .filter(|(p, _)| *p == field.property)
                .map(|(_, v)| v.clone())
                .collect();
            let value = PropertyValue::capture(
                &field.property,
                field.property_type,
                &raw,
                &field.enum_options,
            )?;
            entries.push((field.property.clone(), value));
        }
        Ok(FormValues { entries })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormValues {
    entries: Vec<(String, PropertyValue)>,
}

impl FormValues {
    pub fn typed(&self) -> &[(String, PropertyValue)] {
        &self.entries
    }

    pub fn get(&self, property: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v)
    }

    /// `(property, text)` pairs in template order, ready for substitution.
    pub fn formatted(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(p, v)| (p.clone(), v.format()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::property::{default_property_mappings, PropertyMapping};

    fn inputs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn person_form() -> Form {
        let mut mappings = default_property_mappings();
        mappings.insert(
            "rel-person".to_string(),
            PropertyMapping::new(PropertyType::List, "Related"),
        );
        mappings.insert(
            "alive".to_string(),
            PropertyMapping::new(PropertyType::Checkbox, "Alive"),
        );
        let properties: Vec<String> = ["full_name", "birth", "rel-person", "alive", "nickname"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Form::build("person", "Person", "_Templates/Temp-Person.md", &properties, &mappings)
    }

    #[test]
    fn test_build_fields_from_mappings() {
        let form = person_form();
        assert_eq!(form.title, "Create Entity-Person");
        assert_eq!(form.fields.len(), 5);
        assert_eq!(form.field("birth").unwrap().property_type, PropertyType::Date);
        assert_eq!(form.field("birth").unwrap().display_name, "出生日期");

        let nickname = form.field("nickname").unwrap();
        assert_eq!(nickname.property_type, PropertyType::Text);
        assert_eq!(nickname.display_name, "nickname");
    }

    #[test]
    fn test_submit_formats_in_template_order() {
        let form = person_form();
        let values = form
            .submit(&inputs(&[
                ("rel-person", "Bob"),
                ("full_name", "Alice"),
                ("rel-person", "Carol"),
                ("alive", "yes"),
            ]))
            .unwrap();

        let formatted = values.formatted();
        let keys: Vec<&str> = formatted.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["full_name", "birth", "rel-person", "alive", "nickname"]);
        assert_eq!(formatted[0].1, "Alice");
        assert_eq!(formatted[1].1, "");
        assert_eq!(formatted[2].1, "\n  - \"Bob\"\n  - \"Carol\"");
        assert_eq!(formatted[3].1, "true");
    }

    #[test]
    fn test_submit_rejects_unknown_property() {
        let form = person_form();
        let err = form.submit(&inputs(&[("favourite_colour", "blue")])).unwrap_err();
        assert!(matches!(err, EntityError::UnknownProperty { .. }));
    }

    #[test]
    fn test_submit_validates_types() {
        let form = person_form();
        let err = form.submit(&inputs(&[("birth", "last tuesday")])).unwrap_err();
        assert!(matches!(err, EntityError::InvalidValue { .. }));
    }

    #[test]
    fn test_unchecked_checkbox_is_false() {
        let form = person_form();
        let values = form.submit(&[]).unwrap();
        assert_eq!(values.get("alive"), Some(&PropertyValue::Checkbox(false)));
    }
}
