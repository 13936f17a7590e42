//! Configuration management.
//!
//! Resolves where the health database and exported profiles live.
//!
//! # Layout
//!
//! Everything sits under a single global directory, `~/.healthprofile/`:
//! - **Database**: `~/.healthprofile/data/health.db`
//! - **Profiles**: `~/.healthprofile/profiles/*.json.hsg`
//!
//! Both can be overridden per invocation (`--db`, `--dir`) or through the
//! `HP_DB` and `HP_PROFILE_DIR` environment variables.

use std::path::{Path, PathBuf};

/// Database file name inside the data directory.
pub const DB_FILE_NAME: &str = "health.db";

/// Get the global health profile directory location.
#[must_use]
pub fn global_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".healthprofile"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `HP_TEST_DB=1` (or any non-empty value).
/// This redirects database operations to an isolated test database.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("HP_TEST_DB")
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

/// Directory holding the database file.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    let subdir = if is_test_mode() { "test" } else { "data" };
    global_dir().map(|dir| dir.join(subdir))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided (`--db` or `HP_DB`), use it directly
/// 2. `HP_TEST_DB` set → `~/.healthprofile/test/health.db`
/// 3. Global location: `~/.healthprofile/data/health.db`
///
/// # Returns
///
/// Returns `None` only if the home directory cannot be determined.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }
    data_dir().map(|dir| dir.join(DB_FILE_NAME))
}

/// Resolve the directory profiles are exported to and listed from.
///
/// Priority:
/// 1. `explicit_dir` (`--dir` or `HP_PROFILE_DIR`)
/// 2. `~/.healthprofile/profiles`
#[must_use]
pub fn resolve_profile_dir(explicit_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = explicit_dir {
        return Some(dir.to_path_buf());
    }
    global_dir().map(|dir| dir.join("profiles"))
}
