//! Fragment decoding: the inverse of the export mapping.
//!
//! Identifiers in the profile are not carried over; the store assigns fresh
//! ones on write. Unit strings are kept as written. Derived fields such as a
//! workout's `duration` are ignored.

use serde_json::Value;

use crate::document::keys;
use crate::export::exporters::workout::{DISTANCE_UNIT, ENERGY_UNIT};
use crate::model::{
    CategorySample, CorrelationMember, CorrelationSample, HealthRecord, Quantity, QuantitySample,
    RecordType, Shape, Workout, WorkoutEvent, WorkoutEventKind, catalog,
};

/// Decode one fragment of a `record_type` section.
///
/// # Errors
///
/// Returns a message describing the first missing or malformed field.
pub fn decode_record(record_type: &RecordType, value: &Value) -> Result<HealthRecord, String> {
    let fragment = as_fragment(value)?;
    match record_type.shape {
        Shape::Quantity { .. } => {
            decode_quantity(record_type.id, fragment).map(HealthRecord::Quantity)
        }
        Shape::Category => decode_category(record_type.id, fragment).map(HealthRecord::Category),
        Shape::Correlation { members } => {
            decode_correlation(record_type.id, members, fragment).map(HealthRecord::Correlation)
        }
        Shape::Workout => decode_workout(fragment).map(HealthRecord::Workout),
    }
}

fn as_fragment(value: &Value) -> Result<&serde_json::Map<String, Value>, String> {
    value
        .as_object()
        .ok_or_else(|| format!("expected an object, found {value}"))
}

fn field<'v>(map: &'v serde_json::Map<String, Value>, key: &str) -> Result<&'v Value, String> {
    map.get(key).ok_or_else(|| format!("missing field {key}"))
}

fn req_i64(map: &serde_json::Map<String, Value>, key: &str) -> Result<i64, String> {
    field(map, key)?
        .as_i64()
        .ok_or_else(|| format!("field {key} must be an integer"))
}

fn opt_i64(map: &serde_json::Map<String, Value>, key: &str) -> Result<Option<i64>, String> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| format!("field {key} must be an integer")),
    }
}

fn req_f64(map: &serde_json::Map<String, Value>, key: &str) -> Result<f64, String> {
    field(map, key)?
        .as_f64()
        .ok_or_else(|| format!("field {key} must be a number"))
}

fn req_str<'v>(map: &'v serde_json::Map<String, Value>, key: &str) -> Result<&'v str, String> {
    field(map, key)?
        .as_str()
        .ok_or_else(|| format!("field {key} must be a string"))
}

fn decode_quantity(
    type_id: &str,
    map: &serde_json::Map<String, Value>,
) -> Result<QuantitySample, String> {
    Ok(QuantitySample {
        uuid: None,
        type_id: type_id.to_string(),
        start_ms: req_i64(map, keys::S_DATE)?,
        end_ms: opt_i64(map, keys::E_DATE)?,
        value: req_f64(map, keys::VALUE)?,
        unit: req_str(map, keys::UNIT)?.to_string(),
    })
}

fn decode_category(
    type_id: &str,
    map: &serde_json::Map<String, Value>,
) -> Result<CategorySample, String> {
    Ok(CategorySample {
        uuid: None,
        type_id: type_id.to_string(),
        start_ms: req_i64(map, keys::S_DATE)?,
        end_ms: opt_i64(map, keys::E_DATE)?,
        value: req_i64(map, keys::VALUE)?,
    })
}

fn decode_correlation(
    type_id: &str,
    members: &[&str],
    map: &serde_json::Map<String, Value>,
) -> Result<CorrelationSample, String> {
    let objects = field(map, keys::OBJECTS)?
        .as_array()
        .ok_or_else(|| format!("field {} must be an array", keys::OBJECTS))?;

    let mut children = Vec::with_capacity(objects.len());
    for object in objects {
        let child = as_fragment(object)?;
        let child_type = req_str(child, keys::TYPE)?;
        if !members.iter().any(|m| *m == child_type) {
            return Err(format!("{child_type} cannot be part of {type_id}"));
        }
        let record_type =
            catalog::find(child_type).ok_or_else(|| format!("unknown record type {child_type}"))?;
        let member = match record_type.shape {
            Shape::Quantity { .. } => {
                CorrelationMember::Quantity(decode_quantity(child_type, child)?)
            }
            Shape::Category => CorrelationMember::Category(decode_category(child_type, child)?),
            other => return Err(format!("{child_type} is a {other} type")),
        };
        children.push(member);
    }

    Ok(CorrelationSample {
        uuid: None,
        type_id: type_id.to_string(),
        start_ms: req_i64(map, keys::S_DATE)?,
        end_ms: opt_i64(map, keys::E_DATE)?,
        objects: children,
    })
}

fn decode_workout(map: &serde_json::Map<String, Value>) -> Result<Workout, String> {
    let activity_type = field(map, keys::WORKOUT_ACTIVITY_TYPE)?
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| format!("field {} must be an activity code", keys::WORKOUT_ACTIVITY_TYPE))?;
    let start_ms = req_i64(map, keys::S_DATE)?;
    let end_ms = opt_i64(map, keys::E_DATE)?.unwrap_or(start_ms);

    let total = |key: &str, unit: &str| -> Result<Option<Quantity>, String> {
        match map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_f64()
                .map(|value| Some(Quantity::new(value, unit)))
                .ok_or_else(|| format!("field {key} must be a number")),
        }
    };

    let mut events = Vec::new();
    if let Some(raw) = map.get(keys::WORKOUT_EVENTS) {
        let raw = raw
            .as_array()
            .ok_or_else(|| format!("field {} must be an array", keys::WORKOUT_EVENTS))?;
        for event in raw {
            let event = as_fragment(event)?;
            let code = req_i64(event, keys::TYPE)?;
            let kind = WorkoutEventKind::try_from(code)?;
            events.push(WorkoutEvent {
                kind,
                date_ms: req_i64(event, keys::S_DATE)?,
            });
        }
    }

    Ok(Workout {
        uuid: None,
        activity_type,
        start_ms,
        end_ms,
        total_distance: total(keys::TOTAL_DISTANCE, DISTANCE_UNIT)?,
        total_energy_burned: total(keys::TOTAL_ENERGY_BURNED, ENERGY_UNIT)?,
        events,
    })
}
