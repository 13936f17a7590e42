//! Version command implementation.

use crate::document::keys::FORMAT_VERSION;
use crate::error::Result;
use crate::model::catalog;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    version: &'a str,
    build: &'a str,
    profile_format: &'a str,
    record_types: usize,
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let output = VersionOutput {
        version: env!("CARGO_PKG_VERSION"),
        build: if cfg!(debug_assertions) { "dev" } else { "release" },
        profile_format: FORMAT_VERSION,
        record_types: catalog::all().len(),
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!(
        "hp version {} ({}), profile format {}, {} record types",
        output.version, output.build, output.profile_format, output.record_types
    );
    Ok(())
}
