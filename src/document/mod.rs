//! Profile document model.
//!
//! A profile is one JSON object:
//!
//! ```json
//! {
//!   "metaData": {"creationDate": 1700000000000, "profileName": "me", "version": "1.0.0", "type": "JsonSingleDocExportTarget"},
//!   "userData": {"dateOfBirth": 315532800000, "biologicalSex": 2},
//!   "HKQuantityTypeIdentifierBodyMass": [{"sDate": 1700000000000, "value": 70.0, "unit": "kg"}]
//! }
//! ```
//!
//! Fragments keep field insertion order, and each type section is created
//! at most once.

pub mod keys;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised by the document model.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A section was opened, appended to, or closed out of order.
    #[error("Document structure violated: {0}")]
    Structural(String),

    #[error("Document JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Profile document must be a JSON object")]
    NotAnObject,
}

/// Serialized form of one record: an ordered field map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment(Map<String, Value>);

impl Fragment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, keeping insertion order.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Builder form of [`Fragment::insert`].
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Interpret a JSON value as a fragment; `None` if it is not an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }
}

impl From<Fragment> for Value {
    fn from(fragment: Fragment) -> Self {
        fragment.into_value()
    }
}

/// An in-memory profile document.
#[derive(Debug, Clone)]
pub struct ProfileDocument {
    root: Map<String, Value>,
    open_section: Option<String>,
    sections: HashSet<String>,
}

impl Default for ProfileDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileDocument {
    /// An empty document with `metaData` and `userData` sections.
    #[must_use]
    pub fn new() -> Self {
        let mut root = Map::new();
        root.insert(keys::META_DATA.to_string(), Value::Object(Map::new()));
        root.insert(keys::USER_DATA.to_string(), Value::Object(Map::new()));
        Self {
            root,
            open_section: None,
            sections: HashSet::new(),
        }
    }

    pub fn set_meta_data_field(&mut self, key: &str, value: impl Into<Value>) {
        self.set_field(keys::META_DATA, key, value.into());
    }

    pub fn set_user_data_field(&mut self, key: &str, value: impl Into<Value>) {
        self.set_field(keys::USER_DATA, key, value.into());
    }

    fn set_field(&mut self, section: &str, key: &str, value: Value) {
        let entry = self
            .root
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = entry {
            map.insert(key.to_string(), value);
        }
    }

    /// Open the array section for `type_id`.
    ///
    /// # Errors
    ///
    /// Fails if another section is open or `type_id` already has a section.
    pub fn begin_type_section(&mut self, type_id: &str) -> Result<(), DocumentError> {
        if let Some(open) = &self.open_section {
            return Err(DocumentError::Structural(format!(
                "cannot open {type_id} while {open} is open"
            )));
        }
        if !keys::is_type_section(type_id) || !self.sections.insert(type_id.to_string()) {
            return Err(DocumentError::Structural(format!(
                "section {type_id} already exists"
            )));
        }
        self.root
            .insert(type_id.to_string(), Value::Array(Vec::new()));
        self.open_section = Some(type_id.to_string());
        Ok(())
    }

    /// Append a fragment to the currently open section.
    ///
    /// # Errors
    ///
    /// Fails unless `type_id` is the open section.
    pub fn append_record(
        &mut self,
        type_id: &str,
        fragment: Fragment,
    ) -> Result<(), DocumentError> {
        if self.open_section.as_deref() != Some(type_id) {
            return Err(DocumentError::Structural(format!(
                "section {type_id} is not open"
            )));
        }
        match self.root.get_mut(type_id) {
            Some(Value::Array(records)) => {
                records.push(fragment.into_value());
                Ok(())
            }
            _ => Err(DocumentError::Structural(format!(
                "section {type_id} is missing"
            ))),
        }
    }

    /// Close the open section.
    ///
    /// # Errors
    ///
    /// Fails unless `type_id` is the open section.
    pub fn end_type_section(&mut self, type_id: &str) -> Result<(), DocumentError> {
        if self.open_section.as_deref() != Some(type_id) {
            return Err(DocumentError::Structural(format!(
                "section {type_id} is not open"
            )));
        }
        self.open_section = None;
        Ok(())
    }

    /// Serialize to UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Fails while a section is still open.
    pub fn serialize(&self) -> Result<Vec<u8>, DocumentError> {
        if let Some(open) = &self.open_section {
            return Err(DocumentError::Structural(format!(
                "section {open} is still open"
            )));
        }
        Ok(serde_json::to_vec(&self.root)?)
    }

    /// Parse a serialized profile.
    ///
    /// # Errors
    ///
    /// Fails if the bytes are not a JSON object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        match serde_json::from_slice(bytes)? {
            Value::Object(root) => {
                let sections = root
                    .keys()
                    .filter(|k| keys::is_type_section(k))
                    .cloned()
                    .collect();
                Ok(Self {
                    root,
                    open_section: None,
                    sections,
                })
            }
            _ => Err(DocumentError::NotAnObject),
        }
    }

    /// The `metaData` section.
    #[must_use]
    pub fn meta_data(&self) -> Option<&Map<String, Value>> {
        self.root.get(keys::META_DATA).and_then(Value::as_object)
    }

    /// The `userData` section.
    #[must_use]
    pub fn user_data(&self) -> Option<&Map<String, Value>> {
        self.root.get(keys::USER_DATA).and_then(Value::as_object)
    }

    /// The fragments of one type section.
    #[must_use]
    pub fn records(&self, type_id: &str) -> Option<&[Value]> {
        self.root
            .get(type_id)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    }

    /// Record-type sections in document order.
    pub fn type_sections(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.root
            .iter()
            .filter(|(k, _)| keys::is_type_section(k))
            .map(|(k, v)| (k.as_str(), v))
    }
}
