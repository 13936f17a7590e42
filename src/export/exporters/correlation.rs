//! Correlation records.
//!
//! Children are written with their own `uuid` and `type` so the importer can
//! route each one back to its record type. A child without an identifier gets
//! a fresh one.

use crate::document::{Fragment, keys};
use crate::export::exporters::{TypeExporter, normalize, sample_header};
use crate::export::{ErrorCollector, ExportConfiguration};
use crate::model::{CorrelationMember, HealthRecord, RecordType, catalog};

/// Writes `{sDate, [eDate], [uuid], objects: [{uuid, type, ...}]}`.
#[derive(Debug)]
pub struct CorrelationExporter {
    record_type: &'static RecordType,
    export_uuids: bool,
    errors: ErrorCollector,
}

impl CorrelationExporter {
    #[must_use]
    pub fn new(record_type: &'static RecordType, config: &ExportConfiguration) -> Self {
        Self {
            record_type,
            export_uuids: config.export_uuids,
            errors: ErrorCollector::new(),
        }
    }

    fn member_fragment(member: &CorrelationMember) -> Result<Fragment, String> {
        let type_id = member.type_id();
        let uuid = member
            .uuid()
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);
        let child = Fragment::new()
            .with(keys::UUID, uuid)
            .with(keys::TYPE, type_id);

        match member {
            CorrelationMember::Quantity(q) => {
                let unit = catalog::find(type_id)
                    .and_then(RecordType::unit)
                    .ok_or_else(|| format!("{type_id} is not a quantity type"))?;
                let value = normalize(q.value, &q.unit, unit)?;
                Ok(with_times(child, q.start_ms, q.end_ms)
                    .with(keys::VALUE, value)
                    .with(keys::UNIT, unit))
            }
            CorrelationMember::Category(c) => {
                Ok(with_times(child, c.start_ms, c.end_ms).with(keys::VALUE, c.value))
            }
        }
    }
}

fn with_times(mut fragment: Fragment, start_ms: i64, end_ms: Option<i64>) -> Fragment {
    fragment.insert(keys::S_DATE, start_ms);
    if let Some(end) = end_ms.filter(|end| *end != start_ms) {
        fragment.insert(keys::E_DATE, end);
    }
    fragment
}

impl TypeExporter for CorrelationExporter {
    fn record_type(&self) -> &'static RecordType {
        self.record_type
    }

    fn to_fragment(&self, record: &HealthRecord) -> Result<Fragment, String> {
        let HealthRecord::Correlation(sample) = record else {
            return Err(format!("expected a correlation for {}", self.record_type));
        };

        let objects = sample
            .objects
            .iter()
            .map(|m| Self::member_fragment(m).map(Fragment::into_value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(
            sample_header(sample.start_ms, sample.end_ms, sample.uuid.as_deref(), self.export_uuids)
                .with(keys::OBJECTS, objects),
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
    use crate::model::{CorrelationSample, QuantitySample};

    fn pressure(type_id: &str, value: f64, uuid: Option<&str>) -> CorrelationMember {
        CorrelationMember::Quantity(QuantitySample {
            uuid: uuid.map(str::to_string),
            type_id: type_id.into(),
            start_ms: 5000,
            end_ms: None,
            value,
            unit: "mmHg".into(),
        })
    }

    fn exporter() -> CorrelationExporter {
        let record_type = catalog::find(catalog::BLOOD_PRESSURE).unwrap();
        CorrelationExporter::new(record_type, &ExportConfiguration::new("t", "."))
    }

    #[test]
    fn test_children_carry_uuid_and_type() {
        let record = HealthRecord::Correlation(CorrelationSample {
            uuid: Some("bp-1".into()),
            type_id: catalog::BLOOD_PRESSURE.into(),
            start_ms: 5000,
            end_ms: None,
            objects: vec![
                pressure(catalog::BLOOD_PRESSURE_DIASTOLIC, 80.0, Some("d-1")),
                pressure(catalog::BLOOD_PRESSURE_SYSTOLIC, 120.0, None),
            ],
        });

        let mut exporter = exporter();
        let out = export_batch(&mut exporter, &[record]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0][keys::UUID], "bp-1");

        let objects = out[0][keys::OBJECTS].as_array().unwrap();
        assert_eq!(objects.len(), 2);
        for child in objects {
            assert!(!child[keys::UUID].as_str().unwrap().is_empty());
            assert!(child[keys::TYPE].as_str().unwrap().contains("BloodPressure"));
            assert_eq!(child[keys::UNIT], "mmHg");
        }
        assert_eq!(objects[0][keys::UUID], "d-1");
        assert_eq!(objects[0][keys::VALUE], 80.0);
        assert_eq!(objects[1][keys::TYPE], catalog::BLOOD_PRESSURE_SYSTOLIC);
        assert_eq!(objects[1][keys::VALUE], 120.0);
    }

    #[test]
    fn test_unconvertible_child_skips_record() {
        let mut bad = pressure(catalog::BLOOD_PRESSURE_SYSTOLIC, 120.0, None);
        if let CorrelationMember::Quantity(q) = &mut bad {
            q.unit = "kg".into();
        }
        let record = HealthRecord::Correlation(CorrelationSample {
            uuid: None,
            type_id: catalog::BLOOD_PRESSURE.into(),
            start_ms: 0,
            end_ms: None,
            objects: vec![bad],
        });

        let mut exporter = exporter();
        assert!(export_batch(&mut exporter, &[record]).is_none());
        assert!(exporter.rethrow_collected_errors().is_err());
    }
}
