use anyhow::Result;
use colored::*;

use entity_creator::{FormField, PropertyType};

use super::{column_width, pad, Context};

pub fn run(ctx: &Context, entity_type: &str, json: bool) -> Result<()> {
    let creator = ctx.creator()?;
    let form = creator.open_form(entity_type)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&form)?);
        return Ok(());
    }

    println!("{}", form.title.bold());
    println!("{}", "=".repeat(50));
    println!("Template: {}", form.template_path.dimmed());
    println!();

    let label_width = column_width(form.fields.iter().map(|f| f.display_name.as_str()));
    let key_width = column_width(form.fields.iter().map(|f| f.property.as_str()));
    for field in &form.fields {
        println!(
            "  {}  {}  {}{}",
            pad(&field.display_name, label_width),
            pad(&field.property, key_width).dimmed(),
            field.property_type.to_string().cyan(),
            field_hint(field)
        );
    }

    println!();
    println!(
        "Fill with: entity create {} --set {}=...",
        form.entity_type,
        form.fields
            .first()
            .map(|f| f.property.as_str())
            .unwrap_or("key")
    );
    Ok(())
}

fn field_hint(field: &FormField) -> String {
    match field.property_type {
        PropertyType::Enum if !field.enum_options.is_empty() => {
            format!(" [{}]", field.enum_options.join("|"))
        }
        PropertyType::Citation => field
            .citation
            .as_ref()
            .map(|c| format!(" [{}: {}]", c.property_name, c.property_value))
            .unwrap_or_default(),
        PropertyType::List => " (repeat --set for each entry)".to_string(),
        PropertyType::Date => " (YYYY-MM-DD)".to_string(),
        PropertyType::DateTime => " (YYYY-MM-DDTHH:MM)".to_string(),
        _ => String::new(),
    }
}
