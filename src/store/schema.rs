//! Database schema for the SQLite health store.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema.
///
/// Timestamps are INTEGER Unix milliseconds, matching the profile format.
/// `payload` holds the serialized record; `start_ms`/`end_ms` are copied out
/// of it for ordering.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS records (
    uuid TEXT PRIMARY KEY,
    type_id TEXT NOT NULL,
    origin TEXT NOT NULL CHECK (origin IN ('foreign', 'generated', 'imported')),
    start_ms INTEGER NOT NULL,
    end_ms INTEGER NOT NULL,
    payload TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_type_origin ON records(type_id, origin);
CREATE INDEX IF NOT EXISTS idx_records_type_start ON records(type_id, start_ms);

CREATE TABLE IF NOT EXISTS user_attributes (
    attribute TEXT PRIMARY KEY,
    value INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
";

/// Apply pragmas and the schema. Idempotent.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}
