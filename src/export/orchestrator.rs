//! Export orchestration.
//!
//! [`HealthDataExporter`] drives one export run:
//!
//! 1. `configure` validates the [`ExportConfiguration`]
//! 2. `export` opens every target, writes `metaData` and `userData`, then
//!    walks the catalog: query, write, close section, fold errors, report
//! 3. targets are closed, or aborted on the first fatal error
//!
//! Per-type failures are summarized and never stop the run.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::export::exporters::{self, MetaDataExporter, TypeExporter, UserDataExporter};
use crate::export::target::ExportTarget;
use crate::export::{
    ExportConfiguration, RecordError, RecordErrorKind, TransferError, failed_type_ids,
};
use crate::model::catalog;
use crate::progress::{EventSender, percent};
use crate::store::HealthStore;

/// Where an exporter is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportState {
    Idle,
    Configuring,
    Exporting,
    Completed,
    Failed,
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Configuring => "configuring",
            Self::Exporting => "exporting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Records written for one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub type_id: String,
    pub records: usize,
}

/// Outcome of a completed export.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    pub types: Vec<TypeSummary>,
    pub records_exported: usize,
    pub failures: Vec<RecordError>,
}

impl ExportSummary {
    /// Whether every type exported without a recorded error.
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

/// Exports the store's records into one or more targets.
pub struct HealthDataExporter<'a> {
    store: &'a dyn HealthStore,
    config: ExportConfiguration,
    state: ExportState,
    configuration_valid: bool,
    events: EventSender,
    cancel: Arc<AtomicBool>,
}

impl fmt::Debug for HealthDataExporter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthDataExporter")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("configuration_valid", &self.configuration_valid)
            .finish_non_exhaustive()
    }
}

impl<'a> HealthDataExporter<'a> {
    #[must_use]
    pub fn new(store: &'a dyn HealthStore, config: ExportConfiguration) -> Self {
        Self {
            store,
            config,
            state: ExportState::Idle,
            configuration_valid: false,
            events: EventSender::disabled(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Send progress to `events`.
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Flag checked between record types; set it to stop the run.
    #[must_use]
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn state(&self) -> ExportState {
        self.state
    }

    #[must_use]
    pub fn configuration(&self) -> &ExportConfiguration {
        &self.config
    }

    #[must_use]
    pub fn configuration_valid(&self) -> bool {
        self.configuration_valid
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Configuration` if it is invalid or a run
    /// already started.
    pub fn configure(&mut self) -> Result<(), TransferError> {
        if !matches!(self.state, ExportState::Idle | ExportState::Configuring) {
            return Err(TransferError::Configuration(format!(
                "cannot configure an exporter that is {}",
                self.state
            )));
        }
        self.state = ExportState::Configuring;
        let result = self.config.validate();
        self.configuration_valid = result.is_ok();
        result
    }

    /// Run the export into `targets`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error before any I/O, or the first fatal
    /// error of the run. Per-type failures are reported in the summary.
    pub fn export(
        &mut self,
        targets: &mut [&mut dyn ExportTarget],
    ) -> Result<ExportSummary, TransferError> {
        if self.state == ExportState::Idle {
            self.configure()?;
        }
        if self.state != ExportState::Configuring || !self.configuration_valid {
            return Err(TransferError::Configuration(
                "export configuration is not valid".to_string(),
            ));
        }
        if targets.is_empty() {
            return Err(TransferError::Configuration(
                "no export targets".to_string(),
            ));
        }
        if let Some(target) = targets.iter().find(|t| !t.is_valid()) {
            return Err(TransferError::Configuration(format!(
                "{} target is not valid",
                target.kind()
            )));
        }

        self.state = ExportState::Exporting;
        info!(
            profile = %self.config.profile_name,
            scope = %self.config.scope,
            targets = targets.len(),
            "Starting export"
        );

        let mut summary = ExportSummary::default();
        match self.run(targets, &mut summary) {
            Ok(()) => {
                self.state = ExportState::Completed;
                info!(
                    records = summary.records_exported,
                    failures = summary.failures.len(),
                    "Export completed"
                );
                self.events.progress("Export completed", 100.0);
                self.events.finished(
                    completion_message(&summary),
                    summary.failures.len(),
                );
                Ok(summary)
            }
            Err(err) => {
                for target in targets.iter_mut() {
                    target.abort();
                }
                self.state = ExportState::Failed;
                warn!(error = %err, "Export failed");
                self.events.progress("Export failed", 100.0);
                self.events.failure(err.kind(), err.to_string());
                Err(err)
            }
        }
    }

    fn run(
        &self,
        targets: &mut [&mut dyn ExportTarget],
        summary: &mut ExportSummary,
    ) -> Result<(), TransferError> {
        let creation_date_ms = chrono::Utc::now().timestamp_millis();
        for target in targets.iter_mut() {
            target.start_export()?;
        }

        MetaDataExporter::new(&self.config, creation_date_ms).write(targets)?;
        UserDataExporter::write(self.store, targets)?;

        let filter = self.config.scope.provenance_filter();
        let record_types = catalog::all();
        let total = record_types.len();

        for (index, record_type) in record_types.iter().enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                return Err(TransferError::Cancelled);
            }

            let mut exporter = exporters::for_type(record_type, &self.config);
            let (records, query_error) = match self.store.query(record_type, filter) {
                Ok(records) => (records, None),
                Err(e) => {
                    warn!(type_id = record_type.id, error = %e, "Store query failed");
                    (Vec::new(), Some(e))
                }
            };

            exporter.write_results(&records, targets, query_error.as_ref())?;
            for target in targets.iter_mut() {
                target.end_write_type()?;
            }

            let skipped = fold_errors(exporter.as_ref(), summary);
            let exported = records.len().saturating_sub(skipped);
            if exported > 0 {
                summary.types.push(TypeSummary {
                    type_id: record_type.id.to_string(),
                    records: exported,
                });
                summary.records_exported += exported;
            }
            debug!(type_id = record_type.id, records = exported, skipped, "Exported type");

            let done = index + 1;
            if done < total {
                self.events
                    .progress(format!("Exported {}", record_type.id), percent(done, total));
            }
        }

        for target in targets.iter_mut() {
            target.end_export()?;
        }
        Ok(())
    }
}

/// Move an exporter's collected errors into the run summary.
///
/// Returns how many records were skipped during conversion.
fn fold_errors(exporter: &dyn TypeExporter, summary: &mut ExportSummary) -> usize {
    let Err(aggregated) = exporter.rethrow_collected_errors() else {
        return 0;
    };
    warn!(
        type_id = exporter.record_type().id,
        errors = aggregated.errors.len(),
        "Type exported with errors"
    );
    let skipped = aggregated
        .errors
        .iter()
        .filter(|e| e.kind == RecordErrorKind::Conversion)
        .count();
    summary.failures.extend(aggregated.errors);
    skipped
}

fn completion_message(summary: &ExportSummary) -> String {
    if summary.is_clean() {
        format!("Exported {} records", summary.records_exported)
    } else {
        format!(
            "Exported {} records; errors in {}",
            summary.records_exported,
            summary.failed_types().join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::keys;
    use crate::export::{InMemoryTarget, JsonStreamTarget};
    use crate::model::{CategorySample, HealthRecord, QuantitySample};
    use crate::progress::{ProgressEvent, drain, event_channel};
    use crate::store::{MemoryHealthStore, Origin};
    use tempfile::TempDir;

    fn body_mass(start_ms: i64, value: f64) -> HealthRecord {
        HealthRecord::Quantity(QuantitySample {
            uuid: None,
            type_id: catalog::BODY_MASS.into(),
            start_ms,
            end_ms: None,
            value,
            unit: "kg".into(),
        })
    }

    fn stand_hour(start_ms: i64) -> HealthRecord {
        HealthRecord::Category(CategorySample {
            uuid: None,
            type_id: catalog::STAND_HOUR.into(),
            start_ms,
            end_ms: None,
            value: 1,
        })
    }

    fn seeded_store() -> MemoryHealthStore {
        let mut store = MemoryHealthStore::new();
        store
            .insert(vec![body_mass(1000, 70.0), body_mass(2000, 71.0)], Origin::Generated)
            .unwrap();
        store.insert(vec![stand_hour(3000)], Origin::Foreign).unwrap();
        store
    }

    #[test]
    fn test_export_completes() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store();
        let (tx, mut rx) = event_channel();
        let config = ExportConfiguration::new("me", dir.path());
        let mut exporter = HealthDataExporter::new(&store, config).with_events(tx);
        let mut target = InMemoryTarget::new();

        let summary = {
            let mut targets: [&mut dyn ExportTarget; 1] = [&mut target];
            exporter.export(&mut targets).unwrap()
        };

        assert_eq!(exporter.state(), ExportState::Completed);
        assert_eq!(summary.records_exported, 3);
        assert!(summary.is_clean());

        let doc = target.materialize().unwrap();
        assert_eq!(doc.records(catalog::BODY_MASS).unwrap().len(), 2);
        assert_eq!(doc.records(catalog::STAND_HOUR).unwrap().len(), 1);
        assert!(doc.records(catalog::HEART_RATE).is_none());

        let meta = doc.meta_data().unwrap();
        assert!(meta.contains_key(keys::CREATION_DATE));
        assert_eq!(meta[keys::PROFILE_NAME], "me");
        assert_eq!(meta[keys::VERSION], keys::FORMAT_VERSION);

        let events = drain(&mut rx);
        let percents: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents.len(), catalog::all().len());
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(percents.iter().filter(|p| **p >= 100.0).count(), 1);
        assert_eq!(*percents.last().unwrap(), 100.0);
        assert!(matches!(events.last(), Some(ProgressEvent::Finished { failures: 0, .. })));
    }

    #[test]
    fn test_scope_filters_records() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store();
        let config = ExportConfiguration::new("me", dir.path())
            .with_scope(crate::export::ExportScope::GeneratedByApp);
        let mut exporter = HealthDataExporter::new(&store, config);
        let mut target = InMemoryTarget::new();
        {
            let mut targets: [&mut dyn ExportTarget; 1] = [&mut target];
            exporter.export(&mut targets).unwrap();
        }

        let doc = target.materialize().unwrap();
        assert!(doc.records(catalog::BODY_MASS).is_some());
        assert!(doc.records(catalog::STAND_HOUR).is_none());
    }

    #[test]
    fn test_query_failure_does_not_fail_run() {
        let dir = TempDir::new().unwrap();
        let mut store = seeded_store();
        store.fail_queries_for(catalog::BODY_MASS);
        let config = ExportConfiguration::new("me", dir.path());
        let mut exporter = HealthDataExporter::new(&store, config);
        let mut target = InMemoryTarget::new();

        let summary = {
            let mut targets: [&mut dyn ExportTarget; 1] = [&mut target];
            exporter.export(&mut targets).unwrap()
        };

        assert_eq!(exporter.state(), ExportState::Completed);
        assert_eq!(summary.failed_types(), vec![catalog::BODY_MASS]);
        assert_eq!(summary.failures[0].kind, RecordErrorKind::Query);
        assert_eq!(summary.records_exported, 1);
        assert!(target.materialize().unwrap().records(catalog::BODY_MASS).is_none());
    }

    #[test]
    fn test_invalid_configuration_fails_before_io() {
        let store = MemoryHealthStore::new();
        let mut exporter = HealthDataExporter::new(&store, ExportConfiguration::new("", "."));
        assert!(exporter.configure().is_err());
        assert!(!exporter.configuration_valid());

        let mut target = InMemoryTarget::new();
        let mut targets: [&mut dyn ExportTarget; 1] = [&mut target];
        assert!(matches!(
            exporter.export(&mut targets),
            Err(TransferError::Configuration(_))
        ));
        assert!(targets[0].is_valid());
    }

    #[test]
    fn test_invalid_target_fails_before_io() {
        let dir = TempDir::new().unwrap();
        let store = MemoryHealthStore::new();
        let config = ExportConfiguration::new("me", dir.path());
        let mut exporter = HealthDataExporter::new(&store, config);
        let mut target = JsonStreamTarget::to_file(dir.path().join("missing/p.json.hsg"), false);
        let mut targets: [&mut dyn ExportTarget; 1] = [&mut target];

        assert!(matches!(
            exporter.export(&mut targets),
            Err(TransferError::Configuration(_))
        ));
        assert_eq!(exporter.state(), ExportState::Configuring);
    }

    #[test]
    fn test_cancel_aborts_targets() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store();
        let config = ExportConfiguration::new("me", dir.path());
        let path = config.output_path();
        let (tx, mut rx) = event_channel();
        let mut exporter = HealthDataExporter::new(&store, config).with_events(tx);
        exporter.cancel();

        let mut target = JsonStreamTarget::to_file(&path, false);
        let result = {
            let mut targets: [&mut dyn ExportTarget; 1] = [&mut target];
            exporter.export(&mut targets)
        };

        assert!(matches!(result, Err(TransferError::Cancelled)));
        assert_eq!(exporter.state(), ExportState::Failed);
        assert!(!path.exists());
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
        assert!(matches!(
            drain(&mut rx).last(),
            Some(ProgressEvent::Failure { kind, .. }) if kind == "cancelled"
        ));
    }

    #[test]
    fn test_exporter_runs_once() {
        let dir = TempDir::new().unwrap();
        let store = MemoryHealthStore::new();
        let config = ExportConfiguration::new("me", dir.path());
        let mut exporter = HealthDataExporter::new(&store, config);
        let mut first = InMemoryTarget::new();
        {
            let mut targets: [&mut dyn ExportTarget; 1] = [&mut first];
            exporter.export(&mut targets).unwrap();
        }
        let mut second = InMemoryTarget::new();
        let mut targets: [&mut dyn ExportTarget; 1] = [&mut second];
        assert!(exporter.export(&mut targets).is_err());
    }

    #[test]
    fn test_streaming_and_memory_targets_agree() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store();
        let config = ExportConfiguration::new("me", dir.path());
        let mut exporter = HealthDataExporter::new(&store, config);
        let mut memory = InMemoryTarget::new();
        let mut stream = JsonStreamTarget::new(Vec::new());
        {
            let mut targets: [&mut dyn ExportTarget; 2] = [&mut memory, &mut stream];
            exporter.export(&mut targets).unwrap();
        }

        let streamed: serde_json::Value =
            serde_json::from_slice(&stream.into_inner().unwrap()).unwrap();
        let materialized: serde_json::Value =
            serde_json::from_str(&memory.json_string().unwrap()).unwrap();
        assert_eq!(streamed, materialized);
    }
}
