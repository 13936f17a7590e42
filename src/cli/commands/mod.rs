//! Command implementations.

pub mod completions;
pub mod export;
pub mod generate;
pub mod import;
pub mod init;
pub mod profile;
pub mod status;
pub mod version;

use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::config::{resolve_db_path, resolve_profile_dir};
use crate::error::{Error, Result};
use crate::profile::{HealthProfile, output_file_name};
use crate::progress::{EventReceiver, ProgressEvent};
use crate::store::SqliteHealthStore;

/// Open the existing database.
///
/// # Errors
///
/// Returns `NotInitialized` if the database file does not exist yet.
pub(crate) fn open_store(db_path: Option<&PathBuf>) -> Result<SqliteHealthStore> {
    let db_path = resolve_db_path(db_path.map(|p| p.as_path())).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    Ok(SqliteHealthStore::open(&db_path)?)
}

/// Profile directory from `--dir`, `HP_PROFILE_DIR`, or the default.
pub(crate) fn profile_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_profile_dir(explicit)
        .ok_or_else(|| Error::Config("Could not determine profile directory".to_string()))
}

/// Resolve a profile argument: an existing file path, or a profile name
/// looked up in the profile directory.
pub(crate) fn resolve_profile(arg: &str, dir: Option<&Path>) -> Result<HealthProfile> {
    let as_path = Path::new(arg);
    if as_path.is_file() {
        return HealthProfile::open(as_path);
    }
    HealthProfile::open(profile_dir(dir)?.join(output_file_name(arg)))
}

/// Print progress events until the sending side is dropped.
pub(crate) async fn report_progress(mut rx: EventReceiver, show: bool) {
    while let Some(event) = rx.recv().await {
        if !show {
            continue;
        }
        match event {
            ProgressEvent::Progress { message, percent } => {
                eprintln!("{} {message}", format!("[{percent:>5.1}%]").dimmed());
            }
            ProgressEvent::Failure { kind, detail } => {
                eprintln!("{} {detail}", format!("[{kind}]").red());
            }
            ProgressEvent::Finished { .. } => {}
        }
    }
}
