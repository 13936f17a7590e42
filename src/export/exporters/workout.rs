//! Workout records.

use crate::document::{Fragment, keys};
use crate::export::exporters::{TypeExporter, normalize};
use crate::export::{ErrorCollector, ExportConfiguration};
use crate::model::{HealthRecord, Quantity, RecordType};

/// Unit of `totalDistance`.
pub const DISTANCE_UNIT: &str = "m";
/// Unit of `totalEnergyBurned`.
pub const ENERGY_UNIT: &str = "kcal";

/// Writes `{[uuid], workoutActivityType, sDate, eDate, duration,
/// totalDistance, totalEnergyBurned, workoutEvents}`.
///
/// `duration` is active seconds: the wall-clock span minus paused intervals.
/// Events are written in chronological order.
#[derive(Debug)]
pub struct WorkoutExporter {
    record_type: &'static RecordType,
    export_uuids: bool,
    errors: ErrorCollector,
}

impl WorkoutExporter {
    #[must_use]
    pub fn new(record_type: &'static RecordType, config: &ExportConfiguration) -> Self {
        Self {
            record_type,
            export_uuids: config.export_uuids,
            errors: ErrorCollector::new(),
        }
    }
}

fn total(quantity: Option<&Quantity>, unit: &str) -> Result<Option<f64>, String> {
    quantity
        .map(|q| normalize(q.value, &q.unit, unit))
        .transpose()
}

impl TypeExporter for WorkoutExporter {
    fn record_type(&self) -> &'static RecordType {
        self.record_type
    }

    fn to_fragment(&self, record: &HealthRecord) -> Result<Fragment, String> {
        let HealthRecord::Workout(workout) = record else {
            return Err(format!("expected a workout for {}", self.record_type));
        };
        if workout.end_ms < workout.start_ms {
            return Err(format!(
                "workout ends before it starts ({} < {})",
                workout.end_ms, workout.start_ms
            ));
        }

        let mut fragment = Fragment::new();
        if self.export_uuids {
            if let Some(uuid) = &workout.uuid {
                fragment.insert(keys::UUID, uuid.as_str());
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let duration_secs = workout.active_duration_ms() as f64 / 1000.0;

        fragment.insert(keys::WORKOUT_ACTIVITY_TYPE, workout.activity_type);
        fragment.insert(keys::S_DATE, workout.start_ms);
        fragment.insert(keys::E_DATE, workout.end_ms);
        fragment.insert(keys::DURATION, duration_secs);
        if let Some(distance) = total(workout.total_distance.as_ref(), DISTANCE_UNIT)? {
            fragment.insert(keys::TOTAL_DISTANCE, distance);
        }
        if let Some(energy) = total(workout.total_energy_burned.as_ref(), ENERGY_UNIT)? {
            fragment.insert(keys::TOTAL_ENERGY_BURNED, energy);
        }

        let events: Vec<serde_json::Value> = workout
            .chronological_events()
            .into_iter()
            .map(|e| {
                Fragment::new()
                    .with(keys::TYPE, e.kind.code())
                    .with(keys::S_DATE, e.date_ms)
                    .into_value()
            })
            .collect();
        fragment.insert(keys::WORKOUT_EVENTS, events);

        Ok(fragment)
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
    use crate::model::{Workout, WorkoutEvent, WorkoutEventKind, catalog};

    const MIN: i64 = 60_000;
    const START: i64 = 1_700_000_000_000;

    fn exporter(export_uuids: bool) -> WorkoutExporter {
        let record_type = catalog::find(catalog::WORKOUT_TYPE).unwrap();
        let config = ExportConfiguration::new("t", ".").with_export_uuids(export_uuids);
        WorkoutExporter::new(record_type, &config)
    }

    fn run() -> Workout {
        Workout {
            uuid: Some("w-1".into()),
            activity_type: 37,
            start_ms: START,
            end_ms: START + 10 * MIN,
            total_distance: Some(Quantity::new(4.5, "km")),
            total_energy_burned: Some(Quantity::new(200.6, "kcal")),
            events: vec![
                WorkoutEvent {
                    kind: WorkoutEventKind::Resume,
                    date_ms: START + 3 * MIN,
                },
                WorkoutEvent {
                    kind: WorkoutEventKind::Pause,
                    date_ms: START + 2 * MIN,
                },
            ],
        }
    }

    #[test]
    fn test_workout_fragment() {
        let mut exporter = exporter(true);
        let out = export_batch(&mut exporter, &[HealthRecord::Workout(run())]).unwrap();
        let fragment = &out[0];

        assert_eq!(fragment[keys::UUID], "w-1");
        assert_eq!(fragment[keys::WORKOUT_ACTIVITY_TYPE], 37);
        assert_eq!(fragment[keys::S_DATE], START);
        assert_eq!(fragment[keys::E_DATE], START + 10 * MIN);
        assert_eq!(fragment[keys::DURATION], 540.0);
        assert!((fragment[keys::TOTAL_DISTANCE].as_f64().unwrap() - 4500.0).abs() < 1e-9);
        assert_eq!(fragment[keys::TOTAL_ENERGY_BURNED], 200.6);

        let events = fragment[keys::WORKOUT_EVENTS].as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0][keys::TYPE], WorkoutEventKind::Pause.code());
        assert_eq!(events[1][keys::TYPE], WorkoutEventKind::Resume.code());
        for event in events {
            assert!(event[keys::S_DATE].as_i64().unwrap() > START);
        }
    }

    #[test]
    fn test_uuid_only_when_requested() {
        let mut exporter = exporter(false);
        let out = export_batch(&mut exporter, &[HealthRecord::Workout(run())]).unwrap();
        assert!(out[0].get(keys::UUID).is_none());
        let first_key = out[0].as_object().unwrap().keys().next().unwrap().clone();
        assert_eq!(first_key, keys::WORKOUT_ACTIVITY_TYPE);
    }

    #[test]
    fn test_missing_totals_are_omitted() {
        let mut workout = run();
        workout.total_distance = None;
        workout.total_energy_burned = None;
        workout.events.clear();

        let mut exporter = exporter(false);
        let out = export_batch(&mut exporter, &[HealthRecord::Workout(workout)]).unwrap();
        assert!(out[0].get(keys::TOTAL_DISTANCE).is_none());
        assert_eq!(out[0][keys::DURATION], 600.0);
        assert!(out[0][keys::WORKOUT_EVENTS].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_inverted_workout_is_collected() {
        let mut workout = run();
        workout.end_ms = workout.start_ms - 1;

        let mut exporter = exporter(false);
        assert!(export_batch(&mut exporter, &[HealthRecord::Workout(workout)]).is_none());
        assert_eq!(exporter.take_errors().len(), 1);
    }
}
