use anyhow::{bail, Result};
use clap::Subcommand;
use colored::*;

use entity_creator::{PropertyMapping, PropertyType};

use super::{column_width, pad, Context};

#[derive(Subcommand)]
pub enum MappingCommand {
    /// List property mappings
    List {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Create or update a property mapping
    Set {
        key: String,
        #[arg(long, help = "Label shown in the form")]
        display: Option<String>,
        #[arg(long = "type", help = "Checkbox, Citation, Date, Date & time, Enum, List, Number or Text")]
        property_type: Option<PropertyType>,
        #[arg(long, value_delimiter = ',', help = "Enum options, comma separated")]
        options: Option<Vec<String>>,
        #[arg(long, help = "Citation filter property, e.g. entity-type")]
        citation_property: Option<String>,
        #[arg(long, help = "Citation filter value, e.g. event")]
        citation_value: Option<String>,
    },
    /// Remove a property mapping
    #[command(alias = "remove")]
    Rm { key: String },
}

pub fn run(ctx: &Context, command: MappingCommand) -> Result<()> {
    let mut settings = ctx.load_settings()?;

    match command {
        MappingCommand::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&settings.property_mappings)?);
                return Ok(());
            }
            let key_width = column_width(settings.property_mappings.keys().map(String::as_str));
            let label_width = column_width(
                settings
                    .property_mappings
                    .values()
                    .map(|m| m.display_name.as_str()),
            );
            for (key, mapping) in &settings.property_mappings {
                println!(
                    "  {}  {}  {}{}",
                    pad(key, key_width).cyan(),
                    pad(&mapping.display_name, label_width),
                    mapping.property_type,
                    describe_options(mapping).dimmed()
                );
            }
            return Ok(());
        }
        MappingCommand::Set {
            key,
            display,
            property_type,
            options,
            citation_property,
            citation_value,
        } => {
            if display.is_none()
                && property_type.is_none()
                && options.is_none()
                && citation_property.is_none()
                && citation_value.is_none()
                && settings.property_mapping(&key).is_some()
            {
                bail!("Nothing to change for '{}'", key);
            }
            if settings.property_mapping(&key).is_none() {
                let label = display.clone().unwrap_or_else(|| key.clone());
                settings.set_property_mapping(&key, PropertyMapping::text(label))?;
            }
            if let Some(display) = display {
                settings.set_display_name(&key, &display)?;
            }
            if let Some(property_type) = property_type {
                settings.set_property_type(&key, property_type)?;
            }
            if let Some(options) = options {
                settings.set_enum_options(&key, options)?;
            }
            if citation_property.is_some() || citation_value.is_some() {
                settings.set_citation_config(
                    &key,
                    citation_property.as_deref(),
                    citation_value.as_deref(),
                )?;
            }
            if let Some(mapping) = settings.property_mapping(&key) {
                println!(
                    "{} {} → {} ({}){}",
                    "✓".green(),
                    key.bold(),
                    mapping.display_name,
                    mapping.property_type,
                    describe_options(mapping)
                );
            }
        }
        MappingCommand::Rm { key } => {
            if settings.remove_property_mapping(&key).is_none() {
                bail!("No mapping for '{}'", key);
            }
            println!("{} Removed mapping {}", "✓".green(), key.bold());
        }
    }

    ctx.save_settings(&settings)
}

fn describe_options(mapping: &PropertyMapping) -> String {
    match mapping.property_type {
        PropertyType::Enum => format!(" [{}]", mapping.options().join("|")),
        PropertyType::Citation => mapping
            .citation_config
            .as_ref()
            .map(|c| format!(" [{}: {}]", c.property_name, c.property_value))
            .unwrap_or_default(),
        _ => String::new(),
    }
}
