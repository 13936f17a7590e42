//! Generate command implementation.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::cli::commands::open_store;
use crate::error::{Error, Result};
use crate::generate::{GeneratorConfig, generate};
use crate::store::{HealthStore, Origin};

#[derive(Serialize)]
struct GenerateOutput {
    days: u32,
    seed: u64,
    records: usize,
    attributes: usize,
}

/// Write generated sample records into the database.
///
/// # Errors
///
/// Returns an error if `days` is zero, the database is missing, or a write
/// fails.
pub fn execute(days: u32, seed: u64, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    if days == 0 {
        return Err(Error::InvalidArgument("days must be at least 1".to_string()));
    }

    let mut store = open_store(db_path)?;
    let data = generate(&GeneratorConfig::new(days, seed));
    let records = data.records.len();
    let attributes = data.attributes.len();

    store.write_records(data.records, Origin::Generated)?;
    for (attribute, value) in data.attributes {
        store.set_user_attribute(attribute, value)?;
    }
    info!(days, seed, records, "Generated sample records");

    if json {
        let output = GenerateOutput {
            days,
            seed,
            records,
            attributes,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Generated {records} records over {days} days (seed {seed})");
    }
    Ok(())
}
