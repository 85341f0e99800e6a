//! Status command

use anyhow::Result;
use comfy_table::{Table, presets};
use crossterm::style::Stylize;
use packsync_core::manifest;
use std::path::Path;

/// Show what the install manifest at `root` records.
pub async fn status(root: &Path) -> Result<()> {
    let root = std::path::absolute(root)?;
    let path = manifest::manifest_path(&root);
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        println!("{}", "No pack installed here".dark_grey());
        return Ok(());
    }
    let manifest = manifest::load(&path).await?;

    let updated = tokio::fs::metadata(&path)
        .await
        .ok()
        .and_then(|m| m.modified().ok())
        .map_or_else(
            || "unknown".to_string(),
            |t| {
                chrono::DateTime::<chrono::Local>::from(t)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            },
        );

    let label_width = 12;
    println!();
    println!("{:<label_width$}{}", "Version:", env!("PACKSYNC_VERSION"));
    println!(
        "{:<label_width$}{}",
        "Side:",
        manifest
            .cached_side
            .map_or_else(|| "unknown".to_string(), |s| s.to_string())
    );
    println!(
        "{:<label_width$}{}",
        "Pack:",
        manifest
            .pack_file_hash
            .as_ref()
            .map_or_else(|| "incomplete".to_string(), ToString::to_string)
    );
    println!("{:<label_width$}{}", "Updated:", updated);
    println!("{:<label_width$}{} files", "Files:", manifest.cached_files.len());
    println!();

    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_header(vec!["File", "Location", "Optional"]);
    for (key, record) in &manifest.cached_files {
        let location = record.cached_location.as_ref().map_or_else(
            || {
                if record.only_other_side {
                    "-- (other side)".to_string()
                } else {
                    "--".to_string()
                }
            },
            |p| {
                p.strip_prefix(&root)
                    .unwrap_or(p)
                    .display()
                    .to_string()
            },
        );
        let optional = match (record.is_optional, record.option_value) {
            (false, _) => "",
            (true, true) => "on",
            (true, false) => "off",
        };
        table.add_row(vec![key.as_str(), location.as_str(), optional]);
    }
    println!("{table}");
    Ok(())
}
