//! Data models for health profiles.
//!
//! - [`record`] - the four record shapes
//! - [`catalog`] - the fixed record-type catalog
//! - [`units`] - unit normalization

pub mod catalog;
pub mod record;
pub mod units;

pub use catalog::{RecordType, Shape, WORKOUT_TYPE};
pub use record::{
    CategorySample, CorrelationMember, CorrelationSample, HealthRecord, Quantity, QuantitySample,
    Workout, WorkoutEvent, WorkoutEventKind,
};
