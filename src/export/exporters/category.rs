//! Categorical records.

use crate::document::{Fragment, keys};
use crate::export::exporters::{TypeExporter, sample_header};
use crate::export::{ErrorCollector, ExportConfiguration};
use crate::model::{HealthRecord, RecordType};

/// Writes `{sDate, [eDate], [uuid], value}` with the raw integer code.
#[derive(Debug)]
pub struct CategoryExporter {
    record_type: &'static RecordType,
    export_uuids: bool,
    errors: ErrorCollector,
}

impl CategoryExporter {
    #[must_use]
    pub fn new(record_type: &'static RecordType, config: &ExportConfiguration) -> Self {
        Self {
            record_type,
            export_uuids: config.export_uuids,
            errors: ErrorCollector::new(),
        }
    }
}

impl TypeExporter for CategoryExporter {
    fn record_type(&self) -> &'static RecordType {
        self.record_type
    }

    fn to_fragment(&self, record: &HealthRecord) -> Result<Fragment, String> {
        let HealthRecord::Category(sample) = record else {
            return Err(format!("expected a category sample for {}", self.record_type));
        };
        Ok(
            sample_header(sample.start_ms, sample.end_ms, sample.uuid.as_deref(), self.export_uuids)
                .with(keys::VALUE, sample.value),
        )
    }

    fn collector(&self) -> &ErrorCollector {
        &self.errors
    }

    fn collector_mut(&mut self) -> &mut ErrorCollector {
        &mut self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::exporters::test_support::export_batch;
    use crate::model::{CategorySample, catalog};

    #[test]
    fn test_code_without_end_date() {
        let record_type = catalog::find(catalog::STAND_HOUR).unwrap();
        let mut exporter = CategoryExporter::new(record_type, &ExportConfiguration::new("t", "."));
        let record = HealthRecord::Category(CategorySample {
            uuid: Some("c-1".into()),
            type_id: catalog::STAND_HOUR.into(),
            start_ms: 1000,
            end_ms: Some(1000),
            value: 1,
        });

        let out = export_batch(&mut exporter, &[record]).unwrap();
        assert_eq!(out[0][keys::VALUE], 1);
        assert!(out[0].get(keys::E_DATE).is_none());
        assert_eq!(out[0][keys::UUID], "c-1");
    }

    #[test]
    fn test_keeps_distinct_end_date() {
        let record_type = catalog::find(catalog::SLEEP_ANALYSIS).unwrap();
        let mut exporter = CategoryExporter::new(record_type, &ExportConfiguration::new("t", "."));
        let record = HealthRecord::Category(CategorySample {
            uuid: None,
            type_id: catalog::SLEEP_ANALYSIS.into(),
            start_ms: 1000,
            end_ms: Some(29_000_000),
            value: 0,
        });

        let out = export_batch(&mut exporter, &[record]).unwrap();
        assert_eq!(out[0][keys::E_DATE], 29_000_000);
        assert!(out[0].get(keys::UUID).is_none());
    }
}
