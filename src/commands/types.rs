use anyhow::Result;
use clap::Subcommand;
use colored::*;
use serde::Serialize;

use super::{column_width, pad, Context};

#[derive(Subcommand)]
pub enum TypesCommand {
    /// List entity types and their folders
    List {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Add an entity type; folder and template follow the display name
    Add { id: String, display_name: String },
    /// Remove an entity type and its configuration
    #[command(alias = "remove")]
    Rm { id: String },
    /// Change an entity type's display name
    Rename { id: String, display_name: String },
    /// Set the note folder or template file for an entity type
    Paths {
        id: String,
        #[arg(long, help = "Folder for new notes, relative to the vault")]
        note_path: Option<String>,
        #[arg(long, help = "Template file, relative to the vault")]
        template_path: Option<String>,
    },
}

#[derive(Serialize)]
struct TypeInfo<'a> {
    id: &'a str,
    display_name: &'a str,
    note_path: Option<&'a str>,
    template_path: Option<&'a str>,
}

pub fn run(ctx: &Context, command: TypesCommand) -> Result<()> {
    let mut settings = ctx.load_settings()?;

    match command {
        TypesCommand::List { json } => {
            let types: Vec<TypeInfo> = settings
                .entity_types()
                .into_iter()
                .map(|(id, display_name)| {
                    let config = settings.entity_config(id);
                    TypeInfo {
                        id,
                        display_name,
                        note_path: config.map(|c| c.note_path.as_str()),
                        template_path: config.map(|c| c.template_path.as_str()),
                    }
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&types)?);
                return Ok(());
            }

            let id_width = column_width(types.iter().map(|t| t.id));
            let name_width = column_width(types.iter().map(|t| t.display_name));
            for t in &types {
                println!(
                    "  {}  {}  {} {}",
                    pad(t.id, id_width).cyan(),
                    pad(t.display_name, name_width),
                    t.note_path.unwrap_or("?"),
                    t.template_path.unwrap_or("(no template)").dimmed()
                );
            }
            return Ok(());
        }
        TypesCommand::Add { id, display_name } => {
            settings.add_entity_type(&id, &display_name)?;
            println!("{} Added entity type {} ({})", "✓".green(), id.bold(), display_name);
        }
        TypesCommand::Rm { id } => {
            settings.delete_entity_type(&id)?;
            println!("{} Removed entity type {}", "✓".green(), id.bold());
        }
        TypesCommand::Rename { id, display_name } => {
            settings.rename_entity_type(&id, &display_name)?;
            println!("{} {} is now shown as {}", "✓".green(), id.bold(), display_name);
        }
        TypesCommand::Paths {
            id,
            note_path,
            template_path,
        } => {
            let config =
                settings.set_entity_paths(&id, note_path.as_deref(), template_path.as_deref())?;
            println!(
                "{} {}: notes in {}, template {}",
                "✓".green(),
                id.bold(),
                config.note_path,
                config.template_path
            );
        }
    }

    ctx.save_settings(&settings)
}
