//! In-memory health-data store.
//!
//! Used by tests and by callers that want to run an export or import
//! without touching disk. Failures can be injected per record type.

use std::collections::{HashMap, HashSet};

use crate::model::{HealthRecord, RecordType};
use crate::store::{
    AttributeValue, HealthStore, Origin, ProvenanceFilter, StoreError, StoreResult, UserAttribute,
    assign_identifiers, validate_record,
};

/// A record together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub record: HealthRecord,
    pub origin: Origin,
}

/// Health-data store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryHealthStore {
    records: Vec<StoredRecord>,
    attributes: HashMap<UserAttribute, AttributeValue>,
    failing_queries: HashSet<String>,
    failing_writes: HashSet<String>,
}

impl MemoryHealthStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert records directly, bypassing failure injection.
    ///
    /// # Errors
    ///
    /// Returns an error if a record fails catalog validation.
    pub fn insert(&mut self, records: Vec<HealthRecord>, origin: Origin) -> StoreResult<()> {
        for mut record in records {
            validate_record(&record)?;
            assign_identifiers(&mut record);
            self.records.push(StoredRecord { record, origin });
        }
        Ok(())
    }

    pub fn set_user_attribute(&mut self, attribute: UserAttribute, value: AttributeValue) {
        self.attributes.insert(attribute, value);
    }

    /// Make every query for `type_id` fail.
    pub fn fail_queries_for(&mut self, type_id: &str) {
        self.failing_queries.insert(type_id.to_string());
    }

    /// Make every write or delete for `type_id` fail.
    pub fn fail_writes_for(&mut self, type_id: &str) {
        self.failing_writes.insert(type_id.to_string());
    }

    /// All stored records, in insertion order.
    #[must_use]
    pub fn records(&self) -> &[StoredRecord] {
        &self.records
    }

    /// Stored records of one type.
    #[must_use]
    pub fn records_of(&self, type_id: &str) -> Vec<&StoredRecord> {
        self.records
            .iter()
            .filter(|r| r.record.type_id() == type_id)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl HealthStore for MemoryHealthStore {
    fn query(
        &self,
        record_type: &RecordType,
        filter: ProvenanceFilter,
    ) -> StoreResult<Vec<HealthRecord>> {
        if self.failing_queries.contains(record_type.id) {
            return Err(StoreError::Database(format!(
                "query for {} failed",
                record_type.id
            )));
        }

        let mut matches: Vec<HealthRecord> = self
            .records
            .iter()
            .filter(|r| r.record.type_id() == record_type.id && filter.admits(r.origin))
            .map(|r| r.record.clone())
            .collect();
        matches.sort_by_key(HealthRecord::start_ms);
        Ok(matches)
    }

    fn write_records(&mut self, records: Vec<HealthRecord>, origin: Origin) -> StoreResult<()> {
        let mut prepared = Vec::with_capacity(records.len());
        for mut record in records {
            let type_id = record.type_id();
            if self.failing_writes.contains(type_id) {
                return Err(StoreError::Rejected {
                    type_id: type_id.to_string(),
                    reason: "not authorized".to_string(),
                });
            }
            validate_record(&record)?;
            assign_identifiers(&mut record);
            prepared.push(StoredRecord { record, origin });
        }
        self.records.extend(prepared);
        Ok(())
    }

    fn delete_records(&mut self, type_id: &str) -> StoreResult<usize> {
        if self.failing_writes.contains(type_id) {
            return Err(StoreError::Rejected {
                type_id: type_id.to_string(),
                reason: "not authorized".to_string(),
            });
        }
        let before = self.records.len();
        self.records
            .retain(|r| r.record.type_id() != type_id || !r.origin.is_owned());
        Ok(before - self.records.len())
    }

    fn read_user_attribute(
        &self,
        attribute: UserAttribute,
    ) -> StoreResult<Option<AttributeValue>> {
        Ok(self.attributes.get(&attribute).copied())
    }
}
