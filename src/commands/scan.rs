use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use colored::*;
use serde::Serialize;

use entity_creator::{parse_frontmatter, template_properties};

use super::{column_width, pad, Context};

#[derive(Serialize)]
struct ScanResult {
    file: String,
    has_frontmatter: bool,
    properties: Vec<Property>,
    template_properties: Vec<String>,
}

#[derive(Serialize)]
struct Property {
    key: String,
    value: String,
}

pub fn run(ctx: &Context, file: &Path, json: bool) -> Result<()> {
    let path = if file.exists() {
        file.to_path_buf()
    } else {
        ctx.paths.root.join(file)
    };
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let fm = parse_frontmatter(&content);
    let result = ScanResult {
        file: path.display().to_string(),
        has_frontmatter: fm.has_block(),
        properties: fm
            .iter()
            .map(|(k, v)| Property {
                key: k.to_string(),
                value: v.to_string(),
            })
            .collect(),
        template_properties: template_properties(&content),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{} {}", "FILE:".cyan(), result.file);
    if !result.has_frontmatter {
        println!("{}", "No front matter block found".yellow());
        return Ok(());
    }

    let width = column_width(result.properties.iter().map(|p| p.key.as_str()));
    for property in &result.properties {
        println!("  {}  {}", pad(&property.key, width), property.value.dimmed());
    }
    println!();
    println!(
        "Template properties: {}",
        result.template_properties.join(", ").green()
    );

    Ok(())
}
