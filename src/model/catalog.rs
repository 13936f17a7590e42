//! Fixed catalog of exportable record types.
//!
//! The order of [`all`] is the order of type sections in an exported
//! profile and the order the exporter walks the store.

use std::fmt;

/// Identifier of the single workout record type.
pub const WORKOUT_TYPE: &str = "HKWorkoutTypeIdentifier";

/// Structural shape of a record type, selecting its exporter and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Scalar with unit; carries the canonical unit values are normalized to.
    Quantity { unit: &'static str },
    Category,
    /// Group of child samples; lists the child type identifiers.
    Correlation { members: &'static [&'static str] },
    Workout,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quantity { .. } => write!(f, "quantity"),
            Self::Category => write!(f, "category"),
            Self::Correlation { .. } => write!(f, "correlation"),
            Self::Workout => write!(f, "workout"),
        }
    }
}

/// One entry of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordType {
    pub id: &'static str,
    pub shape: Shape,
}

impl RecordType {
    /// Canonical unit for quantity types.
    #[must_use]
    pub const fn unit(&self) -> Option<&'static str> {
        match self.shape {
            Shape::Quantity { unit } => Some(unit),
            _ => None,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id)
    }
}

const fn quantity(id: &'static str, unit: &'static str) -> RecordType {
    RecordType {
        id,
        shape: Shape::Quantity { unit },
    }
}

const fn category(id: &'static str) -> RecordType {
    RecordType {
        id,
        shape: Shape::Category,
    }
}

pub const BODY_MASS: &str = "HKQuantityTypeIdentifierBodyMass";
pub const HEIGHT: &str = "HKQuantityTypeIdentifierHeight";
pub const BODY_FAT_PERCENTAGE: &str = "HKQuantityTypeIdentifierBodyFatPercentage";
pub const HEART_RATE: &str = "HKQuantityTypeIdentifierHeartRate";
pub const STEP_COUNT: &str = "HKQuantityTypeIdentifierStepCount";
pub const DISTANCE_WALKING_RUNNING: &str = "HKQuantityTypeIdentifierDistanceWalkingRunning";
pub const ACTIVE_ENERGY_BURNED: &str = "HKQuantityTypeIdentifierActiveEnergyBurned";
pub const BODY_TEMPERATURE: &str = "HKQuantityTypeIdentifierBodyTemperature";
pub const BLOOD_GLUCOSE: &str = "HKQuantityTypeIdentifierBloodGlucose";
pub const BLOOD_PRESSURE_SYSTOLIC: &str = "HKQuantityTypeIdentifierBloodPressureSystolic";
pub const BLOOD_PRESSURE_DIASTOLIC: &str = "HKQuantityTypeIdentifierBloodPressureDiastolic";
pub const DIETARY_ENERGY: &str = "HKQuantityTypeIdentifierDietaryEnergyConsumed";
pub const DIETARY_PROTEIN: &str = "HKQuantityTypeIdentifierDietaryProtein";
pub const DIETARY_CARBOHYDRATES: &str = "HKQuantityTypeIdentifierDietaryCarbohydrates";
pub const SLEEP_ANALYSIS: &str = "HKCategoryTypeIdentifierSleepAnalysis";
pub const STAND_HOUR: &str = "HKCategoryTypeIdentifierAppleStandHour";
pub const MINDFUL_SESSION: &str = "HKCategoryTypeIdentifierMindfulSession";
pub const BLOOD_PRESSURE: &str = "HKCorrelationTypeIdentifierBloodPressure";
pub const FOOD: &str = "HKCorrelationTypeIdentifierFood";

const CATALOG: &[RecordType] = &[
    quantity(BODY_MASS, "kg"),
    quantity(HEIGHT, "m"),
    quantity(BODY_FAT_PERCENTAGE, "%"),
    quantity(HEART_RATE, "count/min"),
    quantity(STEP_COUNT, "count"),
    quantity(DISTANCE_WALKING_RUNNING, "m"),
    quantity(ACTIVE_ENERGY_BURNED, "kcal"),
    quantity(BODY_TEMPERATURE, "degC"),
    quantity(BLOOD_GLUCOSE, "mg/dL"),
    quantity(BLOOD_PRESSURE_SYSTOLIC, "mmHg"),
    quantity(BLOOD_PRESSURE_DIASTOLIC, "mmHg"),
    quantity(DIETARY_ENERGY, "kcal"),
    quantity(DIETARY_PROTEIN, "g"),
    quantity(DIETARY_CARBOHYDRATES, "g"),
    category(SLEEP_ANALYSIS),
    category(STAND_HOUR),
    category(MINDFUL_SESSION),
    RecordType {
        id: BLOOD_PRESSURE,
        shape: Shape::Correlation {
            members: &[BLOOD_PRESSURE_SYSTOLIC, BLOOD_PRESSURE_DIASTOLIC],
        },
    },
    RecordType {
        id: FOOD,
        shape: Shape::Correlation {
            members: &[DIETARY_ENERGY, DIETARY_PROTEIN, DIETARY_CARBOHYDRATES],
        },
    },
    RecordType {
        id: WORKOUT_TYPE,
        shape: Shape::Workout,
    },
];

/// Every record type, in export order.
#[must_use]
pub fn all() -> &'static [RecordType] {
    CATALOG
}

/// Look up a record type by identifier.
#[must_use]
pub fn find(id: &str) -> Option<&'static RecordType> {
    CATALOG.iter().find(|t| t.id == id)
}
