use crate::schema::ImportPlan;
use anyhow::Result;
use colored::*;
use log::info;
use std::path::Path;

pub fn inspect_command(path: &Path) -> Result<()> {
    info!("Inspecting import plan: {}", path.display());

    let plan = ImportPlan::from_path(path)?;

    println!();
    println!("  {}", format!("Import plan {}", path.display()).bright_white().bold());
    for line in plan.summary().to_string().lines() {
        println!("  {}", line);
    }

    if !plan.item_types.to_create.is_empty() {
        println!();
        println!("  {}", "Item types to create:".bright_white().bold());
        for item_type in &plan.item_types.to_create {
            let rename = item_type
                .rename
                .as_ref()
                .map(|rename| format!(" → {}", rename.api_key))
                .unwrap_or_default();
            println!(
                "  ○ {}{} ({} fields, {} fieldsets)",
                item_type.label().cyan(),
                rename.bright_yellow(),
                item_type.fields.len(),
                item_type.fieldsets.len()
            );
        }
    }
    println!();

    Ok(())
}
