//! SQLite-backed health store.
//!
//! Records are stored as JSON payloads keyed by identifier, with type,
//! origin and timestamps lifted into columns for filtering and ordering.
//! Writes follow the same transaction discipline as the rest of the
//! storage layer: one IMMEDIATE transaction per batch.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;
use tracing::debug;

use crate::model::{HealthRecord, RecordType};
use crate::store::schema::apply_schema;
use crate::store::{
    AttributeValue, HealthStore, Origin, ProvenanceFilter, StoreError, StoreResult, UserAttribute,
    assign_identifiers, validate_record,
};

/// SQLite-based health store.
#[derive(Debug)]
pub struct SqliteHealthStore {
    conn: Connection,
}

/// Number of stored records of one type and origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub type_id: String,
    pub origin: Origin,
    pub count: usize,
}

impl SqliteHealthStore {
    /// Open a store at the given path, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory store (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Set (or replace) a user characteristic.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub fn set_user_attribute(
        &mut self,
        attribute: UserAttribute,
        value: AttributeValue,
    ) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO user_attributes (attribute, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(attribute) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
            rusqlite::params![
                attribute.key(),
                value.as_i64(),
                chrono::Utc::now().timestamp_millis()
            ],
        )?;
        Ok(())
    }

    /// Record counts grouped by type and origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or an origin value is corrupt.
    pub fn counts_by_type(&self) -> StoreResult<Vec<TypeCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT type_id, origin, COUNT(*) FROM records
             GROUP BY type_id, origin ORDER BY type_id, origin",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(type_id, origin, count)| {
                Ok(TypeCount {
                    type_id,
                    origin: origin.parse().map_err(StoreError::Corrupt)?,
                    count: usize::try_from(count).unwrap_or(0),
                })
            })
            .collect()
    }

    /// Total number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl HealthStore for SqliteHealthStore {
    fn query(
        &self,
        record_type: &RecordType,
        filter: ProvenanceFilter,
    ) -> StoreResult<Vec<HealthRecord>> {
        let origins = filter.origins();
        let placeholders: Vec<String> = (0..origins.len()).map(|i| format!("?{}", i + 2)).collect();
        let sql = format!(
            "SELECT payload FROM records
             WHERE type_id = ?1 AND origin IN ({})
             ORDER BY start_ms ASC, rowid ASC",
            placeholders.join(", ")
        );

        let mut params: Vec<&str> = vec![record_type.id];
        params.extend(origins.iter().map(|o| o.as_str()));

        let mut stmt = self.conn.prepare(&sql)?;
        let payloads = stmt
            .query_map(rusqlite::params_from_iter(params), |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(type_id = record_type.id, records = payloads.len(), "Queried store");

        payloads
            .iter()
            .map(|p| serde_json::from_str(p).map_err(|e| StoreError::Corrupt(e.to_string())))
            .collect()
    }

    fn write_records(&mut self, records: Vec<HealthRecord>, origin: Origin) -> StoreResult<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        for mut record in records {
            validate_record(&record)?;
            assign_identifiers(&mut record);
            let payload =
                serde_json::to_string(&record).map_err(|e| StoreError::Corrupt(e.to_string()))?;
            tx.execute(
                "INSERT INTO records (uuid, type_id, origin, start_ms, end_ms, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    record.uuid(),
                    record.type_id(),
                    origin.as_str(),
                    record.start_ms(),
                    record.end_ms(),
                    payload,
                    now
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn delete_records(&mut self, type_id: &str) -> StoreResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM records WHERE type_id = ?1 AND origin IN ('generated', 'imported')",
            [type_id],
        )?;
        debug!(type_id, removed, "Deleted owned records");
        Ok(removed)
    }

    fn read_user_attribute(
        &self,
        attribute: UserAttribute,
    ) -> StoreResult<Option<AttributeValue>> {
        let raw: Option<i64> = self
            .conn
            .query_row(
                "SELECT value FROM user_attributes WHERE attribute = ?1",
                [attribute.key()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw.map(|v| AttributeValue::for_attribute(attribute, v)))
    }
}
