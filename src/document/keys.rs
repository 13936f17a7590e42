//! Field names of the profile document format.

pub const META_DATA: &str = "metaData";
pub const USER_DATA: &str = "userData";

pub const CREATION_DATE: &str = "creationDate";
pub const PROFILE_NAME: &str = "profileName";
pub const VERSION: &str = "version";
pub const TYPE: &str = "type";

pub const DATE_OF_BIRTH: &str = "dateOfBirth";
pub const BIOLOGICAL_SEX: &str = "biologicalSex";
pub const BLOOD_TYPE: &str = "bloodType";
pub const FITZPATRICK_SKIN_TYPE: &str = "fitzpatrickSkinType";

pub const UUID: &str = "uuid";
pub const S_DATE: &str = "sDate";
pub const E_DATE: &str = "eDate";
pub const VALUE: &str = "value";
pub const UNIT: &str = "unit";
pub const OBJECTS: &str = "objects";

pub const WORKOUT_ACTIVITY_TYPE: &str = "workoutActivityType";
pub const DURATION: &str = "duration";
pub const TOTAL_DISTANCE: &str = "totalDistance";
pub const TOTAL_ENERGY_BURNED: &str = "totalEnergyBurned";
pub const WORKOUT_EVENTS: &str = "workoutEvents";

/// Format version written into every profile.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Kind name written into `metaData.type` by the single-document targets.
pub const SINGLE_DOC_KIND: &str = "JsonSingleDocExportTarget";

/// Whether a top-level key names a record-type section.
#[must_use]
pub fn is_type_section(key: &str) -> bool {
    key != META_DATA && key != USER_DATA
}
