//! Scalar-with-unit records.

use crate::document::{Fragment, keys};
use crate::export::exporters::{TypeExporter, normalize, sample_header};
use crate::export::{ErrorCollector, ExportConfiguration};
use crate::model::{HealthRecord, RecordType};

/// Writes `{sDate, [eDate], [uuid], value, unit}` with the value in the
/// type's canonical unit.
#[derive(Debug)]
pub struct QuantityExporter {
    record_type: &'static RecordType,
    unit: &'static str,
    export_uuids: bool,
    errors: ErrorCollector,
}

impl QuantityExporter {
    #[must_use]
    pub fn new(
        record_type: &'static RecordType,
        unit: &'static str,
        config: &ExportConfiguration,
    ) -> Self {
        Self {
            record_type,
            unit,
            export_uuids: config.export_uuids,
            errors: ErrorCollector::new(),
        }
    }
}

impl TypeExporter for QuantityExporter {
    fn record_type(&self) -> &'static RecordType {
        self.record_type
    }

    fn to_fragment(&self, record: &HealthRecord) -> Result<Fragment, String> {
        let HealthRecord::Quantity(sample) = record else {
            return Err(format!("expected a quantity sample for {}", self.record_type));
        };
        let value = normalize(sample.value, &sample.unit, self.unit)?;
        Ok(
            sample_header(sample.start_ms, sample.end_ms, sample.uuid.as_deref(), self.export_uuids)
                .with(keys::VALUE, value)
                .with(keys::UNIT, self.unit),
        )
    }

    fn collector(&self) -> &ErrorCollector {
        &self.errors
    }

    fn collector_mut(&mut self) -> &mut ErrorCollector {
        &mut self.errors
    }
}
