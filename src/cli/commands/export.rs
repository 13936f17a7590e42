//! Export command implementation.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use tracing::debug;

use crate::cli::ExportArgs;
use crate::cli::commands::{open_store, profile_dir, report_progress};
use crate::error::{Error, Result};
use crate::export::{
    ExportConfiguration, ExportSummary, ExportTarget, HealthDataExporter, JsonStreamTarget,
};
use crate::progress::event_channel;

/// Execute the export command.
///
/// The export runs on a blocking worker while progress is printed from the
/// runtime thread.
///
/// # Errors
///
/// Returns an error if the database is missing, the configuration is
/// invalid, or the run fails.
pub fn execute(
    args: &ExportArgs,
    db_path: Option<&PathBuf>,
    json: bool,
    show_progress: bool,
) -> Result<()> {
    let store = open_store(db_path)?;
    let dir = profile_dir(args.dir.as_deref())?;
    fs::create_dir_all(&dir)?;

    let config = ExportConfiguration::new(args.name.clone(), dir)
        .with_scope(args.scope.into())
        .with_overwrite(args.overwrite)
        .with_export_uuids(!args.no_uuids);
    let output = config.output_path();
    debug!(path = %output.display(), "Resolved export path");

    let (tx, rx) = event_channel();
    let worker_output = output.clone();
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create runtime: {e}")))?;

    let summary = rt.block_on(async move {
        let worker = tokio::task::spawn_blocking(move || {
            let overwrite = config.overwrite_if_exists;
            let mut exporter = HealthDataExporter::new(&store, config).with_events(tx);
            exporter.configure()?;
            let mut target = JsonStreamTarget::to_file(worker_output, overwrite);
            let mut targets: [&mut dyn ExportTarget; 1] = [&mut target];
            exporter.export(&mut targets)
        });
        report_progress(rx, show_progress).await;
        worker
            .await
            .map_err(|e| Error::Other(format!("Export worker failed: {e}")))?
            .map_err(Error::from)
    })?;

    print_summary(&summary, &output, json)
}

fn print_summary(summary: &ExportSummary, output: &std::path::Path, json: bool) -> Result<()> {
    if json {
        let payload = serde_json::json!({
            "success": true,
            "path": output.display().to_string(),
            "summary": summary,
        });
        println!("{}", serde_json::to_string(&payload)?);
        return Ok(());
    }

    println!("Exported {} records to {}", summary.records_exported, output.display());
    if !summary.types.is_empty() {
        println!();
        for t in &summary.types {
            println!("  {:<52} {:>7}", t.type_id, t.records);
        }
    }
    if !summary.is_clean() {
        println!();
        println!("{}", format!("{} error(s):", summary.failures.len()).yellow());
        for failure in &summary.failures {
            println!("  {failure}");
        }
    }
    Ok(())
}
