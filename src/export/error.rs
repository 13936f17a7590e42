//! Error taxonomy shared by export and import runs.
//!
//! Two levels:
//!
//! - [`TransferError`] - returned from target, exporter and orchestrator calls.
//!   Every variant aborts the run.
//! - [`RecordError`] - a per-type or per-record problem. These are collected
//!   by an [`ErrorCollector`] and summarized, never propagated mid-run.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::document::DocumentError;
use crate::store::StoreError;

/// Errors raised while transferring a profile.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Invalid scope, name, path, or target; raised before any I/O.
    #[error("Invalid export configuration: {0}")]
    Configuration(String),

    /// A target method was called out of lifecycle order.
    #[error("Export target misuse: {0}")]
    Structural(String),

    /// The destination could not be opened, written or closed.
    #[error("Sink error: {0}")]
    Sink(#[from] std::io::Error),

    #[error("Profile document error: {0}")]
    Document(#[from] serde_json::Error),

    #[error("Transfer cancelled")]
    Cancelled,
}

impl TransferError {
    /// Short kind name used in progress failure events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Structural(_) => "structural",
            Self::Sink(_) => "sink",
            Self::Document(_) => "document",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<DocumentError> for TransferError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Json(e) => Self::Document(e),
            other => Self::Structural(other.to_string()),
        }
    }
}

/// What went wrong with a record or type batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordErrorKind {
    /// The store query for the type failed.
    Query,
    /// The store rejected a write or delete.
    Write,
    /// A record could not be mapped into a fragment.
    Conversion,
    /// A fragment could not be decoded back into a record.
    Decode,
    /// A profile section names a type outside the catalog.
    UnknownType,
}

impl fmt::Display for RecordErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Query => "query",
            Self::Write => "write",
            Self::Conversion => "conversion",
            Self::Decode => "decode",
            Self::UnknownType => "unknown type",
        };
        f.write_str(s)
    }
}

/// A non-fatal failure scoped to one record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordError {
    pub type_id: String,
    pub kind: RecordErrorKind,
    pub message: String,
}

impl RecordError {
    #[must_use]
    pub fn new(type_id: &str, kind: RecordErrorKind, message: impl Into<String>) -> Self {
        Self {
            type_id: type_id.to_string(),
            kind,
            message: message.into(),
        }
    }

    /// Wrap a failed store query.
    #[must_use]
    pub fn query(type_id: &str, err: &StoreError) -> Self {
        Self::new(type_id, RecordErrorKind::Query, err.to_string())
    }

    /// Wrap a rejected store write.
    #[must_use]
    pub fn write(type_id: &str, err: &StoreError) -> Self {
        Self::new(type_id, RecordErrorKind::Write, err.to_string())
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.type_id, self.kind, self.message)
    }
}

/// Distinct type identifiers in `errors`, in first-seen order.
#[must_use]
pub fn failed_type_ids(errors: &[RecordError]) -> Vec<&str> {
    let mut ids: Vec<&str> = Vec::new();
    for e in errors {
        if !ids.contains(&e.type_id.as_str()) {
            ids.push(&e.type_id);
        }
    }
    ids
}

/// Every non-fatal error recorded by one exporter or importer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct AggregatedExportError {
    pub errors: Vec<RecordError>,
}

impl fmt::Display for AggregatedExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error(s) collected in {}",
            self.errors.len(),
            failed_type_ids(&self.errors).join(", ")
        )
    }
}

/// Collects non-fatal errors for later inspection.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<RecordError>,
}

impl ErrorCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, error: RecordError) {
        tracing::debug!(
            type_id = %error.type_id,
            kind = %error.kind,
            message = %error.message,
            "Recorded transfer error"
        );
        self.errors.push(error);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[RecordError] {
        &self.errors
    }

    /// Fail with everything recorded so far. Does not clear the collector.
    ///
    /// # Errors
    ///
    /// Returns `AggregatedExportError` when any error has been recorded.
    pub fn rethrow(&self) -> Result<(), AggregatedExportError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AggregatedExportError {
                errors: self.errors.clone(),
            })
        }
    }

    /// Take every recorded error, leaving the collector empty.
    pub fn drain(&mut self) -> Vec<RecordError> {
        std::mem::take(&mut self.errors)
    }
}
