//! Profile-level sections: `metaData` and `userData`.

use tracing::warn;

use crate::document::{Fragment, keys};
use crate::export::target::ExportTarget;
use crate::export::{ExportConfiguration, TransferError};
use crate::store::{HealthStore, UserAttribute};

/// Writes `{creationDate, profileName, version, type}`.
#[derive(Debug, Clone)]
pub struct MetaDataExporter {
    profile_name: String,
    creation_date_ms: i64,
}

impl MetaDataExporter {
    /// Metadata stamped with `creation_date_ms`, the export start time.
    #[must_use]
    pub fn new(config: &ExportConfiguration, creation_date_ms: i64) -> Self {
        Self {
            profile_name: config.profile_name.clone(),
            creation_date_ms,
        }
    }

    /// Fields for a target of the given kind.
    #[must_use]
    pub fn fragment(&self, kind: &str) -> Fragment {
        Fragment::new()
            .with(keys::CREATION_DATE, self.creation_date_ms)
            .with(keys::PROFILE_NAME, self.profile_name.as_str())
            .with(keys::VERSION, keys::FORMAT_VERSION)
            .with(keys::TYPE, kind)
    }

    /// Write the section into every target.
    ///
    /// # Errors
    ///
    /// Returns the first target failure.
    pub fn write(&self, targets: &mut [&mut dyn ExportTarget]) -> Result<(), TransferError> {
        for target in targets.iter_mut() {
            let fragment = self.fragment(target.kind());
            target.write_meta_data(fragment)?;
        }
        Ok(())
    }
}

/// Writes the user characteristics the store can supply.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserDataExporter;

impl UserDataExporter {
    /// Read every attribute; missing or unreadable ones are left out.
    #[must_use]
    pub fn fragment(store: &dyn HealthStore) -> Fragment {
        let mut fragment = Fragment::new();
        for attribute in UserAttribute::ALL {
            match store.read_user_attribute(attribute) {
                Ok(Some(value)) => fragment.insert(attribute.key(), value.as_i64()),
                Ok(None) => {}
                Err(e) => warn!(attribute = attribute.key(), error = %e, "Skipping user attribute"),
            }
        }
        fragment
    }

    /// Write the section into every target.
    ///
    /// # Errors
    ///
    /// Returns the first target failure.
    pub fn write(
        store: &dyn HealthStore,
        targets: &mut [&mut dyn ExportTarget],
    ) -> Result<(), TransferError> {
        let fragment = Self::fragment(store);
        for target in targets.iter_mut() {
            target.write_user_data(fragment.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::InMemoryTarget;
    use crate::store::{AttributeValue, MemoryHealthStore};

    #[test]
    fn test_metadata_fields() {
        let config = ExportConfiguration::new("my profile", ".");
        let fragment =
            MetaDataExporter::new(&config, 1_700_000_000_000).fragment(keys::SINGLE_DOC_KIND);

        assert_eq!(fragment.get_i64(keys::CREATION_DATE), Some(1_700_000_000_000));
        assert_eq!(fragment.get_str(keys::PROFILE_NAME), Some("my profile"));
        assert_eq!(fragment.get_str(keys::VERSION), Some(keys::FORMAT_VERSION));
        assert_eq!(fragment.get_str(keys::TYPE), Some("JsonSingleDocExportTarget"));
    }

    #[test]
    fn test_user_data_omits_missing() {
        let mut store = MemoryHealthStore::new();
        store.set_user_attribute(UserAttribute::DateOfBirth, AttributeValue::Date(315_532_800_000));
        store.set_user_attribute(UserAttribute::BloodType, AttributeValue::Code(3));

        let fragment = UserDataExporter::fragment(&store);
        assert_eq!(fragment.get_i64(keys::DATE_OF_BIRTH), Some(315_532_800_000));
        assert_eq!(fragment.get_i64(keys::BLOOD_TYPE), Some(3));
        assert!(!fragment.contains_key(keys::BIOLOGICAL_SEX));
        assert!(!fragment.contains_key(keys::FITZPATRICK_SKIN_TYPE));
    }

    #[test]
    fn test_write_requires_open_target() {
        let config = ExportConfiguration::new("p", ".");
        let mut target = InMemoryTarget::new();
        let mut targets: [&mut dyn ExportTarget; 1] = [&mut target];
        assert!(MetaDataExporter::new(&config, 0).write(&mut targets).is_err());
    }
}
