use anyhow::Result;
use colored::*;
use serde::Serialize;

use entity_creator::core::paths::TEMPLATES_DIR;
use entity_creator::template_properties;

use super::Context;

#[derive(Serialize)]
struct TemplateInfo {
    path: String,
    used_by: Vec<String>,
    properties: Vec<String>,
}

pub fn run(ctx: &Context, pattern: Option<&str>, json: bool) -> Result<()> {
    let settings = ctx.load_settings()?;
    let vault = ctx.vault();
    let default_pattern = format!("{}/*.md", TEMPLATES_DIR);
    let pattern = pattern.unwrap_or(&default_pattern);

    let mut templates = Vec::new();
    for path in vault.list_templates(pattern)? {
        let rel = vault.relative(&path);
        let used_by = settings
            .entities
            .iter()
            .filter(|(_, c)| c.template_path == rel)
            .map(|(id, _)| id.clone())
            .collect();
        let properties = std::fs::read_to_string(&path)
            .map(|content| template_properties(&content))
            .unwrap_or_default();
        templates.push(TemplateInfo {
            path: rel,
            used_by,
            properties,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&templates)?);
        return Ok(());
    }

    if templates.is_empty() {
        println!("{} No templates match {}", "✗".red(), pattern);
        return Ok(());
    }

    for t in &templates {
        let used = if t.used_by.is_empty() {
            "unused".dimmed()
        } else {
            t.used_by.join(", ").green()
        };
        println!("{} ({})", t.path.bold(), used);
        println!("   {}", t.properties.join(", "));
    }
    Ok(())
}
