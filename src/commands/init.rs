use anyhow::Result;
use colored::*;

use entity_creator::Settings;

use super::Context;

pub fn run(ctx: &Context, create: bool, force: bool) -> Result<()> {
    let vault = ctx.vault();

    println!("{}", "Entity Creator Setup".bold());
    println!("{}", "=".repeat(50));
    println!();

    println!("{}", "Checking settings...".cyan());
    println!();

    let settings_path = &ctx.paths.settings;
    let settings = if settings_path.exists() && !force {
        println!("{} {} exists", "✓".green(), settings_path.display());
        ctx.load_settings()?
    } else {
        let settings = Settings::default();
        ctx.save_settings(&settings)?;
        println!("{} Wrote {}", "✓".green(), settings_path.display());
        settings
    };

    println!();
    println!("{}", "Checking entity folders and templates...".cyan());
    println!();

    let mut missing = 0;
    let mut created = 0;

    for (id, display) in settings.entity_types() {
        let Some(config) = settings.entity_config(id) else {
            missing += 1;
            println!("{} {} has no configuration", "✗".red(), id);
            continue;
        };

        if vault.exists(&config.note_path) {
            println!("{} {} exists ({})", "✓".green(), config.note_path, display);
        } else if create {
            vault.create_folder(&config.note_path)?;
            created += 1;
            println!("{} Created {} ({})", "✓".green(), config.note_path, display);
        } else {
            missing += 1;
            println!("{} {} missing ({})", "✗".red(), config.note_path, display);
        }

        if vault.is_file(&config.template_path) {
            println!("{} {} exists", "✓".green(), config.template_path);
        } else {
            missing += 1;
            println!(
                "{} {} missing (template for {})",
                "✗".red(),
                config.template_path,
                display
            );
        }
    }

    println!();
    println!("{}", "Summary".bold());
    println!("{}", "=".repeat(50));
    if create {
        println!("Created: {} folders", created.to_string().green());
    }
    println!(
        "Missing: {}",
        if missing > 0 {
            missing.to_string().red()
        } else {
            missing.to_string().green()
        }
    );
    println!();

    if missing == 0 {
        println!("{}", "✓ Vault is ready for entity notes!".green());
    } else if !create {
        println!(
            "{}",
            "Run with --create to create missing folders. Templates must be written by hand.".yellow()
        );
    }

    Ok(())
}
