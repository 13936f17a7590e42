//! Typed health records.
//!
//! A health record is one of four closed shapes. The codec matches on
//! [`HealthRecord`] exhaustively, so adding a shape is a compile error
//! everywhere a mapping is missing.
//!
//! All timestamps are Unix milliseconds.

use serde::{Deserialize, Serialize};

use crate::model::catalog::WORKOUT_TYPE;

/// A scalar measurement with a unit (body mass, heart rate, step count...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitySample {
    pub uuid: Option<String>,
    pub type_id: String,
    pub start_ms: i64,
    pub end_ms: Option<i64>,
    pub value: f64,
    pub unit: String,
}

/// A categorical observation carrying an integer code (sleep stage, stand hour...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySample {
    pub uuid: Option<String>,
    pub type_id: String,
    pub start_ms: i64,
    pub end_ms: Option<i64>,
    pub value: i64,
}

/// A child of a correlation. Correlations only group scalar or categorical samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum CorrelationMember {
    Quantity(QuantitySample),
    Category(CategorySample),
}

impl CorrelationMember {
    /// Record-type identifier of the child.
    #[must_use]
    pub fn type_id(&self) -> &str {
        match self {
            Self::Quantity(q) => &q.type_id,
            Self::Category(c) => &c.type_id,
        }
    }

    /// Identifier of the child, if the store assigned one.
    #[must_use]
    pub fn uuid(&self) -> Option<&str> {
        match self {
            Self::Quantity(q) => q.uuid.as_deref(),
            Self::Category(c) => c.uuid.as_deref(),
        }
    }
}

/// A set of related samples recorded together (e.g. systolic + diastolic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSample {
    pub uuid: Option<String>,
    pub type_id: String,
    pub start_ms: i64,
    pub end_ms: Option<i64>,
    pub objects: Vec<CorrelationMember>,
}

/// A value with its unit, as reported by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

impl Quantity {
    #[must_use]
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}

/// Kind of a workout timeline event. Codes match the platform's raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum WorkoutEventKind {
    Pause,
    Resume,
    Lap,
    Marker,
    MotionPaused,
    MotionResumed,
    Segment,
    PauseOrResumeRequest,
}

impl WorkoutEventKind {
    /// Raw integer code written to the profile.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Pause => 1,
            Self::Resume => 2,
            Self::Lap => 3,
            Self::Marker => 4,
            Self::MotionPaused => 5,
            Self::MotionResumed => 6,
            Self::Segment => 7,
            Self::PauseOrResumeRequest => 8,
        }
    }

    /// Parse a raw code; `None` for codes outside the known set.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Pause),
            2 => Some(Self::Resume),
            3 => Some(Self::Lap),
            4 => Some(Self::Marker),
            5 => Some(Self::MotionPaused),
            6 => Some(Self::MotionResumed),
            7 => Some(Self::Segment),
            8 => Some(Self::PauseOrResumeRequest),
            _ => None,
        }
    }

    const fn pauses(self) -> bool {
        matches!(self, Self::Pause | Self::MotionPaused)
    }

    const fn resumes(self) -> bool {
        matches!(self, Self::Resume | Self::MotionResumed)
    }
}

impl From<WorkoutEventKind> for i64 {
    fn from(kind: WorkoutEventKind) -> Self {
        kind.code()
    }
}

impl TryFrom<i64> for WorkoutEventKind {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("Unknown workout event type: {code}"))
    }
}

/// One point on a workout timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutEvent {
    pub kind: WorkoutEventKind,
    pub date_ms: i64,
}

/// A workout session with its timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub uuid: Option<String>,
    pub activity_type: u32,
    pub start_ms: i64,
    pub end_ms: i64,
    pub total_distance: Option<Quantity>,
    pub total_energy_burned: Option<Quantity>,
    pub events: Vec<WorkoutEvent>,
}

impl Workout {
    /// Events sorted by time. Equal timestamps keep their original order.
    #[must_use]
    pub fn chronological_events(&self) -> Vec<WorkoutEvent> {
        let mut events = self.events.clone();
        events.sort_by_key(|e| e.date_ms);
        events
    }

    /// Active duration in milliseconds.
    ///
    /// Wall-clock span minus every paused interval. A pause without a
    /// matching resume lasts until the end of the workout.
    #[must_use]
    pub fn active_duration_ms(&self) -> i64 {
        let mut paused = 0;
        let mut paused_since: Option<i64> = None;

        for event in self.chronological_events() {
            let at = event.date_ms.clamp(self.start_ms, self.end_ms);
            if event.kind.pauses() && paused_since.is_none() {
                paused_since = Some(at);
            } else if event.kind.resumes() {
                if let Some(since) = paused_since.take() {
                    paused += at - since;
                }
            }
        }
        if let Some(since) = paused_since {
            paused += self.end_ms - since;
        }

        (self.end_ms - self.start_ms - paused).max(0)
    }
}

/// A health record of any shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum HealthRecord {
    Quantity(QuantitySample),
    Category(CategorySample),
    Correlation(CorrelationSample),
    Workout(Workout),
}

impl HealthRecord {
    /// Record-type identifier this record belongs to.
    #[must_use]
    pub fn type_id(&self) -> &str {
        match self {
            Self::Quantity(q) => &q.type_id,
            Self::Category(c) => &c.type_id,
            Self::Correlation(c) => &c.type_id,
            Self::Workout(_) => WORKOUT_TYPE,
        }
    }

    #[must_use]
    pub fn uuid(&self) -> Option<&str> {
        match self {
            Self::Quantity(q) => q.uuid.as_deref(),
            Self::Category(c) => c.uuid.as_deref(),
            Self::Correlation(c) => c.uuid.as_deref(),
            Self::Workout(w) => w.uuid.as_deref(),
        }
    }

    #[must_use]
    pub fn start_ms(&self) -> i64 {
        match self {
            Self::Quantity(q) => q.start_ms,
            Self::Category(c) => c.start_ms,
            Self::Correlation(c) => c.start_ms,
            Self::Workout(w) => w.start_ms,
        }
    }

    /// End timestamp, falling back to the start for instantaneous records.
    #[must_use]
    pub fn end_ms(&self) -> i64 {
        match self {
            Self::Quantity(q) => q.end_ms.unwrap_or(q.start_ms),
            Self::Category(c) => c.end_ms.unwrap_or(c.start_ms),
            Self::Correlation(c) => c.end_ms.unwrap_or(c.start_ms),
            Self::Workout(w) => w.end_ms,
        }
    }

    /// Replace the identifier (top level only).
    pub fn set_uuid(&mut self, uuid: Option<String>) {
        match self {
            Self::Quantity(q) => q.uuid = uuid,
            Self::Category(c) => c.uuid = uuid,
            Self::Correlation(c) => c.uuid = uuid,
            Self::Workout(w) => w.uuid = uuid,
        }
    }
}
