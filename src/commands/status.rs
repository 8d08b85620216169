use anyhow::Result;
use colored::*;
use serde::Serialize;

use super::{column_width, pad, Context};

#[derive(Serialize)]
struct EntityStatus {
    id: String,
    display_name: String,
    note_path: Option<String>,
    template_path: Option<String>,
    template_exists: bool,
    note_count: usize,
}

#[derive(Serialize)]
struct VaultStatus {
    timestamp: String,
    vault: String,
    settings: String,
    settings_exists: bool,
    property_mappings: usize,
    entities: Vec<EntityStatus>,
}

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let settings = ctx.load_settings()?;
    let vault = ctx.vault();

    let mut entities = Vec::new();
    for (id, display) in settings.entity_types() {
        let config = settings.entity_config(id);
        let note_count = match config {
            Some(c) => vault.list_notes(&c.note_path).map(|n| n.len()).unwrap_or(0),
            None => 0,
        };
        entities.push(EntityStatus {
            id: id.to_string(),
            display_name: display.to_string(),
            note_path: config.map(|c| c.note_path.clone()),
            template_path: config.map(|c| c.template_path.clone()),
            template_exists: config.map(|c| vault.is_file(&c.template_path)).unwrap_or(false),
            note_count,
        });
    }

    let status = VaultStatus {
        timestamp: chrono::Local::now().to_rfc3339(),
        vault: ctx.paths.root.display().to_string(),
        settings: ctx.paths.settings.display().to_string(),
        settings_exists: ctx.paths.settings.exists(),
        property_mappings: settings.property_mappings.len(),
        entities,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }

    Ok(())
}

fn print_status(status: &VaultStatus) {
    println!("{}", "Entity Creator Status".bold());
    println!("{}", "=".repeat(50));
    println!();
    println!("Checked: {}", status.timestamp);
    println!("Vault:    {}", status.vault);
    println!(
        "Settings: {} {}",
        status.settings,
        if status.settings_exists {
            "".normal()
        } else {
            "(defaults, not saved)".yellow()
        }
    );
    println!("Property mappings: {}", status.property_mappings);
    println!();

    println!("{}", "Entity types".cyan());
    println!("{}", "-".repeat(50));
    let width = column_width(status.entities.iter().map(|e| e.display_name.as_str()));
    for entity in &status.entities {
        let template = match (&entity.template_path, entity.template_exists) {
            (Some(path), true) => format!("{} {}", "✓".green(), path),
            (Some(path), false) => format!("{} {} (missing)", "✗".red(), path),
            (None, _) => format!("{} no configuration", "✗".red()),
        };
        println!(
            "   {}  {:>4} notes in {}",
            pad(&entity.display_name, width),
            entity.note_count,
            entity.note_path.as_deref().unwrap_or("?")
        );
        println!("   {}  {}", pad("", width), template);
    }
}
