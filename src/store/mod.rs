//! Health-data store collaborator.
//!
//! The exporter and importer only see the narrow [`HealthStore`] trait:
//! type-scoped queries, batch writes, scoped deletes, and user attribute
//! reads. Two implementations ship with the crate:
//!
//! - [`MemoryHealthStore`] - in-memory fake with failure injection
//! - [`SqliteHealthStore`] - persistent store backing the CLI
//!
//! # Provenance
//!
//! Every stored record remembers its [`Origin`]. Exports filter on it, and
//! deletes are only allowed for records this application owns.

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryHealthStore;
pub use sqlite::SqliteHealthStore;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{HealthRecord, RecordType, Shape, catalog, units};

/// Errors reported by a health-data store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store database error: {0}")]
    Database(String),

    #[error("Write to {type_id} rejected: {reason}")]
    Rejected { type_id: String, reason: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Stored payload is corrupt: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Where a stored record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Written by another application; read-only for us.
    Foreign,
    /// Generated by this application.
    Generated,
    /// Written by this application while importing a profile.
    Imported,
}

impl Origin {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Foreign => "foreign",
            Self::Generated => "generated",
            Self::Imported => "imported",
        }
    }

    /// Whether this application may delete the record.
    #[must_use]
    pub const fn is_owned(self) -> bool {
        matches!(self, Self::Generated | Self::Imported)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Origin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "foreign" => Ok(Self::Foreign),
            "generated" => Ok(Self::Generated),
            "imported" => Ok(Self::Imported),
            _ => Err(format!("Unknown origin: {s}")),
        }
    }
}

/// Provenance filter applied to queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvenanceFilter {
    /// Every accessible record.
    Any,
    /// Records written by this application (generated or imported).
    OwnedByApp,
    /// Records generated by this application, excluding imports.
    GeneratedByApp,
}

impl ProvenanceFilter {
    /// Whether a record with `origin` passes the filter.
    #[must_use]
    pub const fn admits(self, origin: Origin) -> bool {
        match self {
            Self::Any => true,
            Self::OwnedByApp => origin.is_owned(),
            Self::GeneratedByApp => matches!(origin, Origin::Generated),
        }
    }

    /// Origins admitted by this filter.
    #[must_use]
    pub fn origins(self) -> Vec<Origin> {
        [Origin::Foreign, Origin::Generated, Origin::Imported]
            .into_iter()
            .filter(|o| self.admits(*o))
            .collect()
    }
}

/// Singleton user characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserAttribute {
    DateOfBirth,
    BiologicalSex,
    BloodType,
    FitzpatrickSkinType,
}

impl UserAttribute {
    pub const ALL: [Self; 4] = [
        Self::DateOfBirth,
        Self::BiologicalSex,
        Self::BloodType,
        Self::FitzpatrickSkinType,
    ];

    /// Storage key; also the profile document key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::DateOfBirth => "dateOfBirth",
            Self::BiologicalSex => "biologicalSex",
            Self::BloodType => "bloodType",
            Self::FitzpatrickSkinType => "fitzpatrickSkinType",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == key)
    }
}

/// Value of a user attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue {
    /// A date, Unix milliseconds.
    Date(i64),
    /// An enumerated code (sex, blood type, skin type).
    Code(i64),
}

impl AttributeValue {
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Date(v) | Self::Code(v) => v,
        }
    }

    /// Wrap a raw stored value with the kind appropriate for `attribute`.
    #[must_use]
    pub const fn for_attribute(attribute: UserAttribute, raw: i64) -> Self {
        match attribute {
            UserAttribute::DateOfBirth => Self::Date(raw),
            _ => Self::Code(raw),
        }
    }
}

/// The narrow capability set the exporter and importer need from a store.
///
/// Every call reports failure explicitly. An empty `Ok` from [`query`]
/// means "no matching records", never "the query failed".
///
/// [`query`]: HealthStore::query
pub trait HealthStore {
    /// All records of one type admitted by `filter`, ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot answer the query.
    fn query(
        &self,
        record_type: &RecordType,
        filter: ProvenanceFilter,
    ) -> StoreResult<Vec<HealthRecord>>;

    /// Persist a batch of records. Records without identifiers get fresh ones.
    ///
    /// # Errors
    ///
    /// Returns an error if any record is rejected; the batch is not partially applied.
    fn write_records(&mut self, records: Vec<HealthRecord>, origin: Origin) -> StoreResult<()>;

    /// Remove the records of one type that this application owns.
    ///
    /// Returns the number of removed records.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete_records(&mut self, type_id: &str) -> StoreResult<usize>;

    /// Read a user characteristic; `Ok(None)` when the store has no value.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute cannot be read.
    fn read_user_attribute(&self, attribute: UserAttribute)
    -> StoreResult<Option<AttributeValue>>;
}

/// Check a record against the catalog before it is persisted.
///
/// Enforces that the type exists, that its shape matches, that quantity
/// units are compatible with the canonical unit, and that correlation
/// children belong to the correlation's member types.
pub(crate) fn validate_record(record: &HealthRecord) -> StoreResult<()> {
    let type_id = record.type_id();
    let record_type = catalog::find(type_id)
        .ok_or_else(|| StoreError::InvalidRecord(format!("unknown record type {type_id}")))?;

    match (record, record_type.shape) {
        (HealthRecord::Quantity(q), Shape::Quantity { unit }) => {
            check_unit(type_id, &q.unit, unit)
        }
        (HealthRecord::Category(_), Shape::Category)
        | (HealthRecord::Workout(_), Shape::Workout) => Ok(()),
        (HealthRecord::Correlation(c), Shape::Correlation { members }) => {
            for member in &c.objects {
                let child_type = member.type_id();
                if !members.iter().any(|m| *m == child_type) {
                    return Err(StoreError::InvalidRecord(format!(
                        "{child_type} cannot be part of {type_id}"
                    )));
                }
                validate_member(member)?;
            }
            Ok(())
        }
        _ => Err(StoreError::InvalidRecord(format!(
            "record shape does not match {} type {type_id}",
            record_type.shape
        ))),
    }
}

fn validate_member(member: &crate::model::CorrelationMember) -> StoreResult<()> {
    use crate::model::CorrelationMember;

    let type_id = member.type_id();
    let child = catalog::find(type_id)
        .ok_or_else(|| StoreError::InvalidRecord(format!("unknown record type {type_id}")))?;
    match (member, child.shape) {
        (CorrelationMember::Quantity(q), Shape::Quantity { unit }) => {
            check_unit(type_id, &q.unit, unit)
        }
        (CorrelationMember::Category(_), Shape::Category) => Ok(()),
        _ => Err(StoreError::InvalidRecord(format!(
            "member shape does not match {} type {type_id}",
            child.shape
        ))),
    }
}

fn check_unit(type_id: &str, unit: &str, canonical: &str) -> StoreResult<()> {
    let actual = units::dimension_of(unit).map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
    let expected =
        units::dimension_of(canonical).map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
    if actual == expected {
        Ok(())
    } else {
        Err(StoreError::InvalidRecord(format!(
            "unit {unit} is not valid for {type_id}"
        )))
    }
}

/// Give the record (and its correlation children) identifiers where missing.
pub(crate) fn assign_identifiers(record: &mut HealthRecord) {
    fn fresh() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    if record.uuid().is_none() {
        record.set_uuid(Some(fresh()));
    }
    if let HealthRecord::Correlation(c) = record {
        for member in &mut c.objects {
            match member {
                crate::model::CorrelationMember::Quantity(q) => {
                    q.uuid.get_or_insert_with(fresh);
                }
                crate::model::CorrelationMember::Category(cat) => {
                    cat.uuid.get_or_insert_with(fresh);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategorySample, CorrelationMember, CorrelationSample, QuantitySample};

    fn quantity(type_id: &str, value: f64, unit: &str) -> QuantitySample {
        QuantitySample {
            uuid: None,
            type_id: type_id.to_string(),
            start_ms: 0,
            end_ms: None,
            value,
            unit: unit.to_string(),
        }
    }

    #[test]
    fn test_provenance_filter() {
        assert!(ProvenanceFilter::Any.admits(Origin::Foreign));
        assert!(!ProvenanceFilter::OwnedByApp.admits(Origin::Foreign));
        assert!(ProvenanceFilter::OwnedByApp.admits(Origin::Imported));
        assert!(ProvenanceFilter::GeneratedByApp.admits(Origin::Generated));
        assert!(!ProvenanceFilter::GeneratedByApp.admits(Origin::Imported));
        assert_eq!(ProvenanceFilter::GeneratedByApp.origins(), vec![Origin::Generated]);
    }

    #[test]
    fn test_validate_accepts_compatible_unit() {
        let record = HealthRecord::Quantity(quantity(catalog::BODY_MASS, 154.0, "lb"));
        assert!(validate_record(&record).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_dimension() {
        let record = HealthRecord::Quantity(quantity(catalog::BODY_MASS, 1.8, "m"));
        assert!(matches!(validate_record(&record), Err(StoreError::InvalidRecord(_))));
    }

    #[test]
    fn test_validate_rejects_foreign_member() {
        let record = HealthRecord::Correlation(CorrelationSample {
            uuid: None,
            type_id: catalog::BLOOD_PRESSURE.to_string(),
            start_ms: 0,
            end_ms: None,
            objects: vec![CorrelationMember::Category(CategorySample {
                uuid: None,
                type_id: catalog::STAND_HOUR.to_string(),
                start_ms: 0,
                end_ms: None,
                value: 1,
            })],
        });
        assert!(validate_record(&record).is_err());
    }

    #[test]
    fn test_assign_identifiers_fills_children() {
        let mut record = HealthRecord::Correlation(CorrelationSample {
            uuid: None,
            type_id: catalog::BLOOD_PRESSURE.to_string(),
            start_ms: 0,
            end_ms: None,
            objects: vec![CorrelationMember::Quantity(quantity(
                catalog::BLOOD_PRESSURE_SYSTOLIC,
                120.0,
                "mmHg",
            ))],
        });
        assign_identifiers(&mut record);
        let HealthRecord::Correlation(c) = &record else {
            unreachable!()
        };
        assert!(c.uuid.is_some());
        assert!(c.objects[0].uuid().is_some());
    }

    #[test]
    fn test_user_attribute_keys() {
        for attr in UserAttribute::ALL {
            assert_eq!(UserAttribute::from_key(attr.key()), Some(attr));
        }
    }
}
