//! Status command implementation.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::commands::open_store;
use crate::error::Result;
use crate::store::sqlite::TypeCount;
use crate::store::{HealthStore, UserAttribute};

/// Output for status command.
#[derive(Serialize)]
struct StatusOutput {
    total: usize,
    types: Vec<TypeCount>,
    user_attributes: serde_json::Map<String, serde_json::Value>,
}

/// Execute status command.
///
/// # Errors
///
/// Returns an error if the database is missing or a query fails.
pub fn execute(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let store = open_store(db_path)?;
    let types = store.counts_by_type()?;
    let total = store.count()?;

    let mut user_attributes = serde_json::Map::new();
    for attribute in UserAttribute::ALL {
        if let Some(value) = store.read_user_attribute(attribute)? {
            user_attributes.insert(attribute.key().to_string(), value.as_i64().into());
        }
    }

    if json {
        let output = StatusOutput {
            total,
            types,
            user_attributes,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("Records: {total}");
    if !types.is_empty() {
        println!();
        for t in &types {
            println!("  {:<52} {:<10} {:>7}", t.type_id, t.origin, t.count);
        }
    }
    if !user_attributes.is_empty() {
        println!();
        println!("User characteristics:");
        for (key, value) in &user_attributes {
            println!("  {key:<22} {value}");
        }
    }
    Ok(())
}
