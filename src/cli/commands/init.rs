//! Create the health database.
//!
//! The database lives at `~/.healthprofile/data/health.db` unless `--db`
//! or `HP_DB` points elsewhere. The schema is applied on open.

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::store::SqliteHealthStore;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    reinitialized: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `force` is not
/// set, or an error if the directory or database cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(|p| p.as_path())).ok_or_else(|| {
        Error::Config("Could not determine global health profile directory".to_string())
    })?;

    let existed = db_path.exists();
    if existed && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if existed {
        fs::remove_file(&db_path)?;
    }
    SqliteHealthStore::open(&db_path)?;

    if json {
        let output = InitOutput {
            database: db_path,
            reinitialized: existed,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
    } else {
        println!("Initialized health database");
        println!("  Database: {}", db_path.display());
        println!();
        println!("Next: run 'hp generate' to add sample records, or 'hp import <profile>'.");
    }

    Ok(())
}
