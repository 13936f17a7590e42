//! Profile command implementations (list and show).

use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;
use tracing::warn;

use crate::cli::ProfileCommands;
use crate::cli::commands::{profile_dir, resolve_profile};
use crate::error::Result;
use crate::profile::{HealthProfile, ProfileMetaData, list_profiles};

#[derive(Serialize)]
struct ProfileEntry {
    file: String,
    path: PathBuf,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta_data: Option<ProfileMetaData>,
}

impl ProfileEntry {
    fn new(profile: &HealthProfile) -> Self {
        let meta_data = match profile.load_meta_data(false) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(path = %profile.path().display(), error = %e, "Unreadable profile");
                None
            }
        };
        Self {
            file: profile.file_stem(),
            path: profile.path().to_path_buf(),
            size: profile.file_size(),
            meta_data,
        }
    }
}

/// Execute profile commands.
pub fn execute(command: &ProfileCommands, json: bool) -> Result<()> {
    match command {
        ProfileCommands::List { dir } => list(dir.as_ref(), json),
        ProfileCommands::Show { profile, dir } => show(profile, dir.as_ref(), json),
    }
}

fn list(dir: Option<&PathBuf>, json: bool) -> Result<()> {
    let dir = profile_dir(dir.map(PathBuf::as_path))?;
    let entries: Vec<ProfileEntry> = list_profiles(&dir)?.iter().map(ProfileEntry::new).collect();

    if json {
        let payload = serde_json::json!({
            "directory": dir.display().to_string(),
            "profiles": entries,
            "count": entries.len(),
        });
        println!("{}", serde_json::to_string(&payload)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No profiles in {}", dir.display());
        return Ok(());
    }

    println!("Profiles in {}:", dir.display());
    println!();
    for entry in &entries {
        let name = entry
            .meta_data
            .as_ref()
            .and_then(|m| m.profile_name.clone())
            .unwrap_or_else(|| "(unreadable)".to_string());
        let created = entry
            .meta_data
            .as_ref()
            .and_then(ProfileMetaData::creation_date)
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "  {:<32} {:<24} {:>16}  {}",
            entry.file.bold(),
            name,
            created,
            format_size(entry.size).dimmed()
        );
    }
    Ok(())
}

fn show(profile: &str, dir: Option<&PathBuf>, json: bool) -> Result<()> {
    let profile = resolve_profile(profile, dir.map(PathBuf::as_path))?;
    let meta = profile.load_meta_data(false)?;

    if json {
        let entry = ProfileEntry {
            file: profile.file_stem(),
            path: profile.path().to_path_buf(),
            size: profile.file_size(),
            meta_data: Some(meta),
        };
        println!("{}", serde_json::to_string(&entry)?);
        return Ok(());
    }

    let field = |v: Option<&str>| v.unwrap_or("-").to_string();
    println!("{}", profile.file_stem().bold());
    println!("  Path:     {}", profile.path().display());
    println!("  Size:     {}", format_size(profile.file_size()));
    println!("  Name:     {}", field(meta.profile_name.as_deref()));
    println!(
        "  Created:  {}",
        meta.creation_date()
            .map_or_else(|| "-".to_string(), |d| d.to_rfc3339())
    );
    println!("  Version:  {}", field(meta.version.as_deref()));
    println!("  Type:     {}", field(meta.kind.as_deref()));
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}
