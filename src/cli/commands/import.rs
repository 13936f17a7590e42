//! Import command implementation.

use std::path::PathBuf;

use colored::Colorize;

use crate::cli::commands::{open_store, report_progress, resolve_profile};
use crate::error::{Error, Result};
use crate::import::{ImportSummary, ProfileImporter};
use crate::progress::event_channel;

/// Execute the import command.
///
/// # Errors
///
/// Returns an error if the database or profile is missing, the profile
/// cannot be parsed, or the worker fails.
pub fn execute(
    profile: &str,
    delete_existing: bool,
    dir: Option<&PathBuf>,
    db_path: Option<&PathBuf>,
    json: bool,
    show_progress: bool,
) -> Result<()> {
    let mut store = open_store(db_path)?;
    let profile = resolve_profile(profile, dir.map(PathBuf::as_path))?;
    let path = profile.path().to_path_buf();

    let (tx, rx) = event_channel();
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create runtime: {e}")))?;

    let summary = rt.block_on(async move {
        let worker = tokio::task::spawn_blocking(move || {
            ProfileImporter::new(&mut store)
                .with_events(tx)
                .import(&profile, delete_existing)
        });
        report_progress(rx, show_progress).await;
        worker
            .await
            .map_err(|e| Error::Other(format!("Import worker failed: {e}")))?
            .map_err(Error::from)
    })?;

    if json {
        let payload = serde_json::json!({
            "success": true,
            "path": path.display().to_string(),
            "summary": summary,
        });
        println!("{}", serde_json::to_string(&payload)?);
        return Ok(());
    }

    print_summary(&summary, &path);
    Ok(())
}

fn print_summary(summary: &ImportSummary, path: &std::path::Path) {
    println!("Imported {} records from {}", summary.records_written, path.display());
    if !summary.types.is_empty() {
        println!();
        for t in &summary.types {
            if t.deleted > 0 {
                println!("  {:<52} {:>7}  (replaced {})", t.type_id, t.records, t.deleted);
            } else {
                println!("  {:<52} {:>7}", t.type_id, t.records);
            }
        }
    }
    if !summary.is_clean() {
        println!();
        println!("{}", format!("{} error(s):", summary.failures.len()).yellow());
        for failure in &summary.failures {
            println!("  {failure}");
        }
    }
}
