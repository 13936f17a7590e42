//! Sample data generator.
//!
//! Produces a plausible, reproducible set of records covering every catalog
//! type so that an empty store has something to export. The same seed and
//! anchor always produce the same records.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{
    CategorySample, CorrelationMember, CorrelationSample, HealthRecord, Quantity, QuantitySample,
    Workout, WorkoutEvent, WorkoutEventKind, catalog,
};
use crate::store::{AttributeValue, UserAttribute};

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Running, from the workout activity code table.
const ACTIVITY_RUNNING: u32 = 37;
/// Cycling.
const ACTIVITY_CYCLING: u32 = 13;

/// Parameters for one generator run.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
    pub days: u32,
    pub seed: u64,
    /// Unix milliseconds of the end of the generated window.
    pub anchor_ms: i64,
}

impl GeneratorConfig {
    #[must_use]
    pub fn new(days: u32, seed: u64) -> Self {
        Self {
            days,
            seed,
            anchor_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor_ms: i64) -> Self {
        self.anchor_ms = anchor_ms;
        self
    }
}

/// Generated records plus user characteristics.
#[derive(Debug, Clone, Default)]
pub struct SampleData {
    pub records: Vec<HealthRecord>,
    pub attributes: Vec<(UserAttribute, AttributeValue)>,
}

/// Generate `config.days` days of samples ending at `config.anchor_ms`.
#[must_use]
pub fn generate(config: &GeneratorConfig) -> SampleData {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let window_start = config.anchor_ms - i64::from(config.days) * DAY_MS;
    let day_start = |day: u32| window_start + i64::from(day) * DAY_MS;

    let mut data = SampleData::default();
    let records = &mut data.records;

    records.push(quantity(catalog::HEIGHT, window_start, rng.gen_range(1.55..1.95), "m"));
    let mut mass = rng.gen_range(55.0..95.0);

    for day in 0..config.days {
        let start = day_start(day);

        mass += rng.gen_range(-0.4..0.4);
        records.push(quantity(catalog::BODY_MASS, start + 7 * HOUR_MS, round1(mass), "kg"));
        if day % 7 == 0 {
            records.push(quantity(
                catalog::BODY_FAT_PERCENTAGE,
                start + 7 * HOUR_MS,
                round1(rng.gen_range(12.0..30.0)),
                "%",
            ));
        }

        for hour in [8, 13, 18, 22] {
            records.push(quantity(
                catalog::HEART_RATE,
                start + hour * HOUR_MS,
                f64::from(rng.gen_range(55_u32..110)),
                "count/min",
            ));
        }

        let steps = f64::from(rng.gen_range(2_000_u32..14_000));
        records.push(interval(
            catalog::STEP_COUNT,
            start + 8 * HOUR_MS,
            start + 20 * HOUR_MS,
            steps,
            "count",
        ));
        records.push(interval(
            catalog::DISTANCE_WALKING_RUNNING,
            start + 8 * HOUR_MS,
            start + 20 * HOUR_MS,
            (steps * 0.75).round(),
            "m",
        ));
        records.push(interval(
            catalog::ACTIVE_ENERGY_BURNED,
            start + 8 * HOUR_MS,
            start + 20 * HOUR_MS,
            round1(steps * 0.04),
            "kcal",
        ));
        records.push(quantity(
            catalog::BODY_TEMPERATURE,
            start + 7 * HOUR_MS,
            round1(rng.gen_range(36.2..37.4)),
            "degC",
        ));
        records.push(quantity(
            catalog::BLOOD_GLUCOSE,
            start + 9 * HOUR_MS,
            f64::from(rng.gen_range(75_u32..130)),
            "mg/dL",
        ));

        records.push(blood_pressure(
            start + 9 * HOUR_MS,
            f64::from(rng.gen_range(105_u32..140)),
            f64::from(rng.gen_range(65_u32..90)),
        ));
        records.push(food(
            start + 12 * HOUR_MS,
            f64::from(rng.gen_range(400_u32..900)),
            f64::from(rng.gen_range(15_u32..45)),
            f64::from(rng.gen_range(40_u32..110)),
        ));

        let sleep_start = start - 2 * HOUR_MS + rng.gen_range(0..HOUR_MS);
        records.push(category(
            catalog::SLEEP_ANALYSIS,
            sleep_start,
            Some(sleep_start + rng.gen_range(6 * HOUR_MS..9 * HOUR_MS)),
            1,
        ));
        for hour in 9..18 {
            if rng.gen_bool(0.7) {
                records.push(category(
                    catalog::STAND_HOUR,
                    start + hour * HOUR_MS,
                    Some(start + (hour + 1) * HOUR_MS),
                    0,
                ));
            }
        }
        if day % 3 == 0 || rng.gen_bool(0.2) {
            let session = start + 21 * HOUR_MS;
            records.push(category(
                catalog::MINDFUL_SESSION,
                session,
                Some(session + 10 * 60_000),
                0,
            ));
        }

        if day % 2 == 1 {
            records.push(HealthRecord::Workout(workout(&mut rng, start + 17 * HOUR_MS)));
        }
    }

    data.attributes = vec![
        (
            UserAttribute::DateOfBirth,
            AttributeValue::Date(
                config.anchor_ms - i64::from(rng.gen_range(20_u32..70)) * 365 * DAY_MS,
            ),
        ),
        (UserAttribute::BiologicalSex, AttributeValue::Code(rng.gen_range(1..=2))),
        (UserAttribute::BloodType, AttributeValue::Code(rng.gen_range(1..=8))),
        (UserAttribute::FitzpatrickSkinType, AttributeValue::Code(rng.gen_range(1..=6))),
    ];
    data
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn quantity(type_id: &str, start_ms: i64, value: f64, unit: &str) -> HealthRecord {
    HealthRecord::Quantity(quantity_sample(type_id, start_ms, None, value, unit))
}

fn interval(type_id: &str, start_ms: i64, end_ms: i64, value: f64, unit: &str) -> HealthRecord {
    HealthRecord::Quantity(quantity_sample(type_id, start_ms, Some(end_ms), value, unit))
}

fn quantity_sample(
    type_id: &str,
    start_ms: i64,
    end_ms: Option<i64>,
    value: f64,
    unit: &str,
) -> QuantitySample {
    QuantitySample {
        uuid: None,
        type_id: type_id.to_string(),
        start_ms,
        end_ms,
        value,
        unit: unit.to_string(),
    }
}

fn category(type_id: &str, start_ms: i64, end_ms: Option<i64>, value: i64) -> HealthRecord {
    HealthRecord::Category(CategorySample {
        uuid: None,
        type_id: type_id.to_string(),
        start_ms,
        end_ms,
        value,
    })
}

fn blood_pressure(at_ms: i64, systolic: f64, diastolic: f64) -> HealthRecord {
    HealthRecord::Correlation(CorrelationSample {
        uuid: None,
        type_id: catalog::BLOOD_PRESSURE.to_string(),
        start_ms: at_ms,
        end_ms: None,
        objects: vec![
            CorrelationMember::Quantity(quantity_sample(
                catalog::BLOOD_PRESSURE_SYSTOLIC,
                at_ms,
                None,
                systolic,
                "mmHg",
            )),
            CorrelationMember::Quantity(quantity_sample(
                catalog::BLOOD_PRESSURE_DIASTOLIC,
                at_ms,
                None,
                diastolic,
                "mmHg",
            )),
        ],
    })
}

fn food(at_ms: i64, energy: f64, protein: f64, carbohydrates: f64) -> HealthRecord {
    let member = |type_id: &str, value: f64, unit: &str| {
        CorrelationMember::Quantity(quantity_sample(type_id, at_ms, None, value, unit))
    };
    HealthRecord::Correlation(CorrelationSample {
        uuid: None,
        type_id: catalog::FOOD.to_string(),
        start_ms: at_ms,
        end_ms: None,
        objects: vec![
            member(catalog::DIETARY_ENERGY, energy, "kcal"),
            member(catalog::DIETARY_PROTEIN, protein, "g"),
            member(catalog::DIETARY_CARBOHYDRATES, carbohydrates, "g"),
        ],
    })
}

fn workout(rng: &mut StdRng, start_ms: i64) -> Workout {
    let minutes = rng.gen_range(20_i64..75);
    let end_ms = start_ms + minutes * 60_000;
    let running = rng.gen_bool(0.5);

    let mut events = Vec::new();
    if minutes > 30 && rng.gen_bool(0.5) {
        let pause = start_ms + minutes / 2 * 60_000;
        events.push(WorkoutEvent {
            kind: WorkoutEventKind::Pause,
            date_ms: pause,
        });
        events.push(WorkoutEvent {
            kind: WorkoutEventKind::Resume,
            date_ms: pause + 60_000,
        });
    }

    #[allow(clippy::cast_precision_loss)]
    let minutes_f = minutes as f64;
    let (activity_type, meters_per_minute) = if running {
        (ACTIVITY_RUNNING, 160.0)
    } else {
        (ACTIVITY_CYCLING, 400.0)
    };

    Workout {
        uuid: None,
        activity_type,
        start_ms,
        end_ms,
        total_distance: Some(Quantity::new((minutes_f * meters_per_minute).round(), "m")),
        total_energy_burned: Some(Quantity::new((minutes_f * 9.5).round(), "kcal")),
        events,
    }
}
