//! Per-shape record exporters.
//!
//! Every catalog type is handled by the exporter for its [`Shape`]. An
//! exporter maps a homogeneous batch into fragments and streams them into
//! every target. Query and conversion problems are collected, not raised:
//! only target failures come back as `Err`.

pub mod category;
pub mod correlation;
pub mod profile_data;
pub mod quantity;
pub mod workout;

pub use category::CategoryExporter;
pub use correlation::CorrelationExporter;
pub use profile_data::{MetaDataExporter, UserDataExporter};
pub use quantity::QuantityExporter;
pub use workout::WorkoutExporter;

use crate::document::{Fragment, keys};
use crate::export::target::ExportTarget;
use crate::export::{
    AggregatedExportError, ErrorCollector, ExportConfiguration, RecordError, RecordErrorKind,
    TransferError,
};
use crate::model::{HealthRecord, RecordType, Shape, units};
use crate::store::StoreError;

/// Maps one record type into profile fragments.
pub trait TypeExporter {
    /// Catalog entry this exporter handles.
    fn record_type(&self) -> &'static RecordType;

    /// Map one record. `Err` carries the reason the record is skipped.
    ///
    /// # Errors
    ///
    /// Returns a message when the record cannot be represented.
    fn to_fragment(&self, record: &HealthRecord) -> Result<Fragment, String>;

    fn collector(&self) -> &ErrorCollector;

    fn collector_mut(&mut self) -> &mut ErrorCollector;

    /// Write one query result into every target.
    ///
    /// With a `query_error` nothing is written and the error is recorded.
    /// An empty batch opens no section.
    ///
    /// # Errors
    ///
    /// Returns target failures only; everything else is collected.
    fn write_results(
        &mut self,
        records: &[HealthRecord],
        targets: &mut [&mut dyn ExportTarget],
        query_error: Option<&StoreError>,
    ) -> Result<(), TransferError> {
        let type_id = self.record_type().id;

        if let Some(err) = query_error {
            self.collector_mut().record(RecordError::query(type_id, err));
            return Ok(());
        }

        let mut fragments = Vec::with_capacity(records.len());
        for record in records {
            let mapped = if record.type_id() == type_id {
                self.to_fragment(record)
            } else {
                Err(format!("record of type {} in {type_id} batch", record.type_id()))
            };
            match mapped {
                Ok(fragment) => fragments.push(fragment),
                Err(message) => self.collector_mut().record(RecordError::new(
                    type_id,
                    RecordErrorKind::Conversion,
                    message,
                )),
            }
        }

        if fragments.is_empty() {
            return Ok(());
        }

        for target in targets.iter_mut() {
            target.start_write_type(type_id)?;
            for fragment in &fragments {
                target.write_record(fragment.clone())?;
            }
        }

        tracing::debug!(type_id, records = fragments.len(), "Wrote type section");
        Ok(())
    }

    /// Fail if any error was recorded since construction.
    ///
    /// # Errors
    ///
    /// Returns every recorded error as one `AggregatedExportError`.
    fn rethrow_collected_errors(&self) -> Result<(), AggregatedExportError> {
        self.collector().rethrow()
    }

    /// Take the recorded errors, leaving the exporter clean.
    fn take_errors(&mut self) -> Vec<RecordError> {
        self.collector_mut().drain()
    }
}

/// Build the exporter for a catalog entry.
#[must_use]
pub fn for_type(
    record_type: &'static RecordType,
    config: &ExportConfiguration,
) -> Box<dyn TypeExporter> {
    match record_type.shape {
        Shape::Quantity { unit } => Box::new(QuantityExporter::new(record_type, unit, config)),
        Shape::Category => Box::new(CategoryExporter::new(record_type, config)),
        Shape::Correlation { .. } => Box::new(CorrelationExporter::new(record_type, config)),
        Shape::Workout => Box::new(WorkoutExporter::new(record_type, config)),
    }
}

/// `sDate`, then `eDate` when it differs from the start, then `uuid` if wanted.
pub(crate) fn sample_header(
    start_ms: i64,
    end_ms: Option<i64>,
    uuid: Option<&str>,
    export_uuids: bool,
) -> Fragment {
    let mut fragment = Fragment::new().with(keys::S_DATE, start_ms);
    if let Some(end) = end_ms.filter(|end| *end != start_ms) {
        fragment.insert(keys::E_DATE, end);
    }
    if export_uuids {
        if let Some(uuid) = uuid {
            fragment.insert(keys::UUID, uuid);
        }
    }
    fragment
}

/// Convert into `canonical`, reporting failures as skip messages.
pub(crate) fn normalize(value: f64, unit: &str, canonical: &str) -> Result<f64, String> {
    let converted = units::convert(value, unit, canonical).map_err(|e| e.to_string())?;
    if converted.is_finite() {
        Ok(converted)
    } else {
        Err(format!("value {value} {unit} is not a finite number"))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::export::InMemoryTarget;
    use serde_json::Value;

    /// Run one batch through an exporter into a fresh in-memory target.
    pub fn export_batch(
        exporter: &mut dyn TypeExporter,
        records: &[HealthRecord],
    ) -> Option<Vec<Value>> {
        let mut target = InMemoryTarget::new();
        target.start_export().unwrap();
        {
            let mut targets: [&mut dyn ExportTarget; 1] = [&mut target];
            exporter.write_results(records, &mut targets, None).unwrap();
        }
        target.end_write_type().unwrap();
        target.end_export().unwrap();
        target
            .materialize()
            .unwrap()
            .records(exporter.record_type().id)
            .map(<[Value]>::to_vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::InMemoryTarget;
    use crate::model::{CategorySample, catalog};

    fn config() -> ExportConfiguration {
        ExportConfiguration::new("t", ".")
    }

    #[test]
    fn test_header_omits_equal_end() {
        let fragment = sample_header(5, Some(5), Some("u"), false);
        assert!(!fragment.contains_key(keys::E_DATE));
        assert!(!fragment.contains_key(keys::UUID));

        let fragment = sample_header(5, Some(9), Some("u"), true);
        let keys: Vec<_> = fragment.keys().collect();
        assert_eq!(keys, vec!["sDate", "eDate", "uuid"]);
    }

    #[test]
    fn test_for_type_dispatches_on_shape() {
        for record_type in catalog::all() {
            let exporter = for_type(record_type, &config());
            assert_eq!(exporter.record_type().id, record_type.id);
        }
    }

    #[test]
    fn test_query_error_writes_nothing() {
        let record_type = catalog::find(catalog::STAND_HOUR).unwrap();
        let mut exporter = for_type(record_type, &config());
        let mut target = InMemoryTarget::new();
        target.start_export().unwrap();

        let err = StoreError::Database("denied".into());
        {
            let mut targets: [&mut dyn ExportTarget; 1] = [&mut target];
            exporter.write_results(&[], &mut targets, Some(&err)).unwrap();
        }
        target.end_write_type().unwrap();
        target.end_export().unwrap();

        assert!(target.materialize().unwrap().records(record_type.id).is_none());
        let aggregated = exporter.rethrow_collected_errors().unwrap_err();
        assert_eq!(aggregated.errors[0].kind, RecordErrorKind::Query);
    }

    #[test]
    fn test_empty_batch_writes_no_section() {
        let record_type = catalog::find(catalog::STAND_HOUR).unwrap();
        let mut exporter = for_type(record_type, &config());
        assert!(test_support::export_batch(exporter.as_mut(), &[]).is_none());
        assert!(exporter.rethrow_collected_errors().is_ok());
    }

    #[test]
    fn test_foreign_record_in_batch_is_skipped() {
        let record_type = catalog::find(catalog::STAND_HOUR).unwrap();
        let mut exporter = for_type(record_type, &config());
        let stray = HealthRecord::Category(CategorySample {
            uuid: None,
            type_id: catalog::SLEEP_ANALYSIS.to_string(),
            start_ms: 0,
            end_ms: None,
            value: 0,
        });
        assert!(test_support::export_batch(exporter.as_mut(), &[stray]).is_none());
        assert_eq!(exporter.take_errors().len(), 1);
        assert!(exporter.rethrow_collected_errors().is_ok());
    }
}
