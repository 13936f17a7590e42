//! Profile import.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::document::ProfileDocument;
use crate::export::{
    ErrorCollector, RecordError, RecordErrorKind, TransferError, failed_type_ids,
};
use crate::import::decode::decode_record;
use crate::model::{HealthRecord, catalog};
use crate::profile::HealthProfile;
use crate::progress::{EventSender, percent};
use crate::store::{HealthStore, Origin};

/// Records per store write.
pub const IMPORT_CHUNK_SIZE: usize = 1000;

/// What happened to one type section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeImport {
    pub type_id: String,
    pub records: usize,
    pub deleted: usize,
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub types: Vec<TypeImport>,
    pub records_written: usize,
    pub failures: Vec<RecordError>,
}

impl ImportSummary {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Types with at least one recorded error, in first-seen order.
    #[must_use]
    pub fn failed_types(&self) -> Vec<&str> {
        failed_type_ids(&self.failures)
    }
}

/// Writes a profile's records into a store.
pub struct ProfileImporter<'a> {
    store: &'a mut dyn HealthStore,
    events: EventSender,
    cancel: Arc<AtomicBool>,
    chunk_size: usize,
    errors: ErrorCollector,
}

impl<'a> ProfileImporter<'a> {
    #[must_use]
    pub fn new(store: &'a mut dyn HealthStore) -> Self {
        Self {
            store,
            events: EventSender::disabled(),
            cancel: Arc::new(AtomicBool::new(false)),
            chunk_size: IMPORT_CHUNK_SIZE,
            errors: ErrorCollector::new(),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Override the write chunk size (minimum 1).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Flag checked between type sections.
    #[must_use]
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Import every type section of `profile`.
    ///
    /// With `delete_existing`, the app-owned records of each type present in
    /// the profile are deleted right before that type is written. A section
    /// with any undecodable fragment leaves that type untouched.
    ///
    /// # Errors
    ///
    /// Fails if the profile cannot be read or parsed, or the run is
    /// cancelled. Per-type failures are reported in the summary.
    pub fn import(
        &mut self,
        profile: &HealthProfile,
        delete_existing: bool,
    ) -> Result<ImportSummary, TransferError> {
        info!(path = %profile.path().display(), delete_existing, "Starting import");
        let parsed = std::fs::read(profile.path())
            .map_err(TransferError::from)
            .and_then(|bytes| ProfileDocument::from_slice(&bytes).map_err(TransferError::from));
        match parsed {
            Ok(document) => self.import_document(&document, delete_existing),
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Import an already parsed document.
    ///
    /// # Errors
    ///
    /// Fails only when the run is cancelled.
    pub fn import_document(
        &mut self,
        document: &ProfileDocument,
        delete_existing: bool,
    ) -> Result<ImportSummary, TransferError> {
        if let Some(user_data) = document.user_data() {
            // Characteristics are read-only in the store.
            debug!(fields = user_data.len(), "Skipping userData section");
        }

        let sections: Vec<(&str, &Value)> = document.type_sections().collect();
        let total = sections.len();
        let mut summary = ImportSummary::default();

        for (index, (type_id, section)) in sections.into_iter().enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                let err = TransferError::Cancelled;
                self.fail(&err);
                return Err(err);
            }

            if let Some(outcome) = self.import_section(type_id, section, delete_existing) {
                summary.records_written += outcome.records;
                summary.types.push(outcome);
            }
            summary.failures.extend(self.errors.drain());

            let done = index + 1;
            if done < total {
                self.events
                    .progress(format!("Imported {type_id}"), percent(done, total));
            }
        }

        info!(
            records = summary.records_written,
            failures = summary.failures.len(),
            "Import completed"
        );
        self.events.progress("Import completed", 100.0);
        let message = if summary.is_clean() {
            format!("Imported {} records", summary.records_written)
        } else {
            format!(
                "Imported {} records; errors in {}",
                summary.records_written,
                summary.failed_types().join(", ")
            )
        };
        self.events.finished(message, summary.failures.len());
        Ok(summary)
    }

    fn import_section(
        &mut self,
        type_id: &str,
        section: &Value,
        delete_existing: bool,
    ) -> Option<TypeImport> {
        let Some(record_type) = catalog::find(type_id) else {
            self.record(type_id, RecordErrorKind::UnknownType, "not in the record catalog");
            return None;
        };
        let Some(fragments) = section.as_array() else {
            self.record(type_id, RecordErrorKind::Decode, "section is not an array");
            return None;
        };

        let mut records: Vec<HealthRecord> = Vec::with_capacity(fragments.len());
        for (position, fragment) in fragments.iter().enumerate() {
            match decode_record(record_type, fragment) {
                Ok(record) => records.push(record),
                Err(message) => self.record(
                    type_id,
                    RecordErrorKind::Decode,
                    format!("record {position}: {message}"),
                ),
            }
        }

        let mut outcome = TypeImport {
            type_id: type_id.to_string(),
            records: 0,
            deleted: 0,
        };

        if delete_existing {
            let rejected = fragments.len() - records.len();
            if rejected > 0 {
                // Existing records are only replaced by a fully decoded section.
                warn!(type_id, rejected, "Section not fully decoded; keeping existing records");
                return Some(outcome);
            }
            match self.store.delete_records(type_id) {
                Ok(deleted) => outcome.deleted = deleted,
                Err(e) => {
                    warn!(type_id, error = %e, "Delete failed; skipping type");
                    self.errors.record(RecordError::write(type_id, &e));
                    return Some(outcome);
                }
            }
        }

        for chunk in records.chunks(self.chunk_size) {
            match self.store.write_records(chunk.to_vec(), Origin::Imported) {
                Ok(()) => outcome.records += chunk.len(),
                Err(e) => {
                    warn!(type_id, records = chunk.len(), error = %e, "Chunk write failed");
                    self.errors.record(RecordError::write(type_id, &e));
                }
            }
        }

        debug!(type_id, records = outcome.records, deleted = outcome.deleted, "Imported type");
        Some(outcome)
    }

    fn record(&mut self, type_id: &str, kind: RecordErrorKind, message: impl Into<String>) {
        self.errors.record(RecordError::new(type_id, kind, message));
    }

    fn fail(&self, err: &TransferError) {
        warn!(error = %err, "Import failed");
        self.events.progress("Import failed", 100.0);
        self.events.failure(err.kind(), err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Fragment, keys};
    use crate::model::{CategorySample, RecordType};
    use crate::progress::{ProgressEvent, drain, event_channel};
    use crate::store::{MemoryHealthStore, ProvenanceFilter};

    fn stand(start: i64) -> Fragment {
        Fragment::new().with(keys::S_DATE, start).with(keys::VALUE, 1)
    }

    fn document(sections: &[(&str, Vec<Fragment>)]) -> ProfileDocument {
        let mut doc = ProfileDocument::new();
        doc.set_meta_data_field(keys::PROFILE_NAME, "p");
        for (type_id, fragments) in sections {
            doc.begin_type_section(type_id).unwrap();
            for fragment in fragments {
                doc.append_record(type_id, fragment.clone()).unwrap();
            }
            doc.end_type_section(type_id).unwrap();
        }
        doc
    }

    fn generated_stand_hour() -> HealthRecord {
        HealthRecord::Category(CategorySample {
            uuid: None,
            type_id: catalog::STAND_HOUR.into(),
            start_ms: 0,
            end_ms: None,
            value: 0,
        })
    }

    fn stand_type() -> &'static RecordType {
        catalog::find(catalog::STAND_HOUR).unwrap()
    }

    #[test]
    fn test_import_writes_records_with_progress() {
        let mut store = MemoryHealthStore::new();
        let doc = document(&[
            (catalog::STAND_HOUR, vec![stand(1), stand(2)]),
            (catalog::SLEEP_ANALYSIS, vec![stand(3)]),
        ]);
        let (tx, mut rx) = event_channel();

        let summary = ProfileImporter::new(&mut store)
            .with_events(tx)
            .import_document(&doc, false)
            .unwrap();

        assert_eq!(summary.records_written, 3);
        assert!(summary.is_clean());
        assert_eq!(store.len(), 3);
        assert!(store.records().iter().all(|r| r.origin == Origin::Imported));
        assert!(store.records().iter().all(|r| r.record.uuid().is_some()));

        let events = drain(&mut rx);
        assert!(matches!(&events[0], ProgressEvent::Progress { percent, .. } if *percent == 50.0));
        assert!(matches!(&events[1], ProgressEvent::Progress { percent, .. } if *percent == 100.0));
        assert!(matches!(events.last(), Some(ProgressEvent::Finished { failures: 0, .. })));
    }

    #[test]
    fn test_delete_existing_is_scoped() {
        let mut store = MemoryHealthStore::new();
        let old = |type_id: &str| {
            HealthRecord::Category(CategorySample {
                uuid: None,
                type_id: type_id.into(),
                start_ms: 0,
                end_ms: None,
                value: 0,
            })
        };
        store.insert(vec![old(catalog::STAND_HOUR)], Origin::Generated).unwrap();
        store.insert(vec![old(catalog::STAND_HOUR)], Origin::Foreign).unwrap();
        store.insert(vec![old(catalog::MINDFUL_SESSION)], Origin::Generated).unwrap();

        let doc = document(&[(catalog::STAND_HOUR, vec![stand(5)])]);
        let summary = ProfileImporter::new(&mut store)
            .import_document(&doc, true)
            .unwrap();

        assert_eq!(summary.types[0].deleted, 1);
        let stand_hours = store.query(stand_type(), ProvenanceFilter::Any).unwrap();
        assert_eq!(stand_hours.len(), 2);
        assert_eq!(store.records_of(catalog::MINDFUL_SESSION).len(), 1);
    }

    #[test]
    fn test_delete_existing_keeps_records_when_section_is_undecodable() {
        let mut store = MemoryHealthStore::new();
        store.insert(vec![generated_stand_hour()], Origin::Generated).unwrap();

        let garbage = Fragment::new().with("garbage", 1);
        let doc = document(&[(catalog::STAND_HOUR, vec![garbage])]);
        let summary = ProfileImporter::new(&mut store)
            .import_document(&doc, true)
            .unwrap();

        assert_eq!(summary.types[0].deleted, 0);
        assert_eq!(summary.records_written, 0);
        assert_eq!(summary.failures[0].kind, RecordErrorKind::Decode);
        assert_eq!(store.records_of(catalog::STAND_HOUR).len(), 1);
    }

    #[test]
    fn test_delete_existing_skips_partially_decoded_section() {
        let mut store = MemoryHealthStore::new();
        store.insert(vec![generated_stand_hour()], Origin::Generated).unwrap();

        let doc = document(&[(
            catalog::STAND_HOUR,
            vec![stand(5), Fragment::new().with(keys::S_DATE, 6)],
        )]);
        let summary = ProfileImporter::new(&mut store)
            .import_document(&doc, true)
            .unwrap();

        assert_eq!(summary.records_written, 0);
        let kept = store.records_of(catalog::STAND_HOUR);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].origin, Origin::Generated);
    }

    #[test]
    fn test_write_failure_is_summarized() {
        let mut store = MemoryHealthStore::new();
        store.fail_writes_for(catalog::STAND_HOUR);
        let doc = document(&[
            (catalog::STAND_HOUR, vec![stand(1)]),
            (catalog::SLEEP_ANALYSIS, vec![stand(2)]),
        ]);

        let summary = ProfileImporter::new(&mut store)
            .import_document(&doc, false)
            .unwrap();

        assert_eq!(summary.failed_types(), vec![catalog::STAND_HOUR]);
        assert_eq!(summary.failures[0].kind, RecordErrorKind::Write);
        assert_eq!(summary.records_written, 1);
    }

    #[test]
    fn test_unknown_and_malformed_sections() {
        let mut store = MemoryHealthStore::new();
        let doc = document(&[
            ("HKQuantityTypeIdentifierMadeUp", vec![stand(1)]),
            (catalog::STAND_HOUR, vec![stand(1), Fragment::new().with(keys::S_DATE, 2)]),
        ]);

        let summary = ProfileImporter::new(&mut store)
            .import_document(&doc, false)
            .unwrap();

        let kinds: Vec<_> = summary.failures.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![RecordErrorKind::UnknownType, RecordErrorKind::Decode]);
        assert_eq!(summary.records_written, 1);
    }

    #[test]
    fn test_chunked_writes() {
        let mut store = MemoryHealthStore::new();
        let doc = document(&[(catalog::STAND_HOUR, (0..5).map(stand).collect())]);

        let summary = ProfileImporter::new(&mut store)
            .with_chunk_size(2)
            .import_document(&doc, false)
            .unwrap();
        assert_eq!(summary.records_written, 5);
    }

    #[test]
    fn test_cancelled_import() {
        let mut store = MemoryHealthStore::new();
        let doc = document(&[(catalog::STAND_HOUR, vec![stand(1)])]);
        let mut importer = ProfileImporter::new(&mut store);
        importer.cancel_handle().store(true, Ordering::SeqCst);

        assert!(matches!(
            importer.import_document(&doc, false),
            Err(TransferError::Cancelled)
        ));
        assert!(store.is_empty());
    }
}
