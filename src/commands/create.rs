use std::fs;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use colored::*;
use serde_yaml::Value;

use entity_creator::{CreateOptions, SubstitutionMode};

use super::Context;

pub struct CreateArgs<'a> {
    pub entity_type: &'a str,
    pub set: &'a [(String, String)],
    pub values_file: Option<&'a Path>,
    pub mode: SubstitutionMode,
    pub dry_run: bool,
    pub overwrite: bool,
    pub json: bool,
}

pub fn run(ctx: &Context, args: CreateArgs<'_>) -> Result<()> {
    let creator = ctx.creator()?;
    let form = creator.open_form(args.entity_type)?;

    let mut inputs = Vec::new();
    if let Some(path) = args.values_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read values file {}", path.display()))?;
        inputs.extend(inputs_from_yaml(&text)?);
    }
    inputs.extend(args.set.iter().cloned());

    let values = form.submit(&inputs)?;
    let options = CreateOptions {
        mode: args.mode,
        overwrite: args.overwrite,
        dry_run: args.dry_run,
    };
    let note = creator.create_note(args.entity_type, &values, options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&note)?);
        return Ok(());
    }

    if note.written {
        println!("{} Created {}", "✓".green(), note.path.bold());
    } else {
        println!("{} {}", "Dry run:".yellow(), note.path.bold());
        println!("{}", "-".repeat(50));
        println!("{}", note.content);
        println!("{}", "-".repeat(50));
    }
    for key in &note.unmatched {
        println!("{} '{}' has no line in the template", "!".yellow(), key);
    }

    Ok(())
}

/// Parse a `key=value` pair from the command line.
pub fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Flatten a YAML mapping into `(key, raw)` inputs; sequences repeat the key.
fn inputs_from_yaml(text: &str) -> Result<Vec<(String, String)>> {
    let doc: Value = serde_yaml::from_str(text).context("Values file is not valid YAML")?;
    let Value::Mapping(map) = doc else {
        bail!("Values file must be a mapping of property to value");
    };

    let mut inputs = Vec::new();
    for (key, value) in map {
        let Some(key) = scalar_text(&key) else {
            bail!("Property names in the values file must be plain scalars");
        };
        match value {
            Value::Sequence(items) => {
                for item in &items {
                    if let Some(text) = scalar_text(item) {
                        inputs.push((key.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(&other) {
                    inputs.push((key, text));
                }
            }
        }
    }
    Ok(inputs)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
