//! Exported profiles on disk.
//!
//! A profile is a `<normalized-name>.json.hsg` file. Its metadata can be
//! probed without reading the record sections: [`HealthProfile::load_meta_data`]
//! walks the top-level object with a serde visitor and skips every other
//! section with [`IgnoredAny`].

use std::cell::OnceCell;
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::document::keys;
use crate::error::{Error, Result};

/// File extension of profile documents.
pub const PROFILE_EXTENSION: &str = ".json.hsg";

/// File stem used when the profile name normalizes to nothing.
pub const DEFAULT_FILE_STEM: &str = "output";

const MAX_STEM_LEN: usize = 100;

/// Turn a free-text profile name into a safe file stem.
///
/// Path separators, reserved characters and whitespace become `_`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let normalized: String = name
        .trim()
        .chars()
        .map(|c| {
            if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
                || c.is_whitespace()
                || c.is_control()
            {
                '_'
            } else {
                c
            }
        })
        .take(MAX_STEM_LEN)
        .collect();

    if normalized.is_empty() || normalized.chars().all(|c| c == '.') {
        DEFAULT_FILE_STEM.to_string()
    } else {
        normalized
    }
}

/// Profile file name for a profile name: `<normalized>.json.hsg`.
#[must_use]
pub fn output_file_name(name: &str) -> String {
    format!("{}{PROFILE_EXTENSION}", normalize_name(name))
}

/// Metadata section of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileMetaData {
    #[serde(rename = "profileName", default)]
    pub profile_name: Option<String>,
    #[serde(rename = "creationDate", default)]
    pub creation_date_ms: Option<i64>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ProfileMetaData {
    /// Creation date as a UTC timestamp.
    #[must_use]
    pub fn creation_date(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.creation_date_ms
            .and_then(chrono::DateTime::from_timestamp_millis)
    }
}

/// Deserializes only `metaData` from a whole profile document.
struct MetaDataOnly(ProfileMetaData);

impl<'de> Deserialize<'de> for MetaDataOnly {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ProfileVisitor;

        impl<'de> Visitor<'de> for ProfileVisitor {
            type Value = MetaDataOnly;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a profile document object")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut meta: Option<ProfileMetaData> = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == keys::META_DATA {
                        if meta.is_some() {
                            return Err(de::Error::duplicate_field(keys::META_DATA));
                        }
                        meta = Some(map.next_value()?);
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
                meta.map(MetaDataOnly)
                    .ok_or_else(|| de::Error::missing_field(keys::META_DATA))
            }
        }

        deserializer.deserialize_map(ProfileVisitor)
    }
}

/// A profile file plus its lazily probed metadata.
#[derive(Debug)]
pub struct HealthProfile {
    path: PathBuf,
    file_size: u64,
    meta: OnceCell<ProfileMetaData>,
}

impl HealthProfile {
    /// Reference an existing profile file.
    ///
    /// # Errors
    ///
    /// Returns `ProfileNotFound` if the path is not a readable file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = fs::metadata(&path)
            .map_err(|_| Error::ProfileNotFound(path.display().to_string()))?;
        if !metadata.is_file() {
            return Err(Error::ProfileNotFound(path.display().to_string()));
        }
        Ok(Self {
            path,
            file_size: metadata.len(),
            meta: OnceCell::new(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// File name without the `.json.hsg` extension.
    #[must_use]
    pub fn file_stem(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.strip_suffix(PROFILE_EXTENSION)
            .map_or_else(|| name.clone(), str::to_string)
    }

    /// Read the `metaData` section, skipping every record section.
    ///
    /// The result is cached; `reload` forces a fresh read.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or has no valid `metaData`.
    pub fn load_meta_data(&self, reload: bool) -> Result<ProfileMetaData> {
        if !reload {
            if let Some(meta) = self.meta.get() {
                return Ok(meta.clone());
            }
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let MetaDataOnly(meta) = serde_json::from_reader(reader)?;
        tracing::debug!(path = %self.path.display(), "Loaded profile metadata");

        // A concurrent reload keeps the first cached value.
        let _ = self.meta.set(meta.clone());
        Ok(meta)
    }
}

/// Every `*.json.hsg` file in `dir`, sorted by file name.
///
/// A missing directory yields an empty list.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
pub fn list_profiles(dir: &Path) -> Result<Vec<HealthProfile>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .is_some_and(|n| n.to_string_lossy().ends_with(PROFILE_EXTENSION))
        })
        .collect();
    paths.sort();

    paths.into_iter().map(HealthProfile::open).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  My Profile "), "My_Profile");
        assert_eq!(normalize_name("a/b\\c:d"), "a_b_c_d");
        assert_eq!(normalize_name(""), "output");
        assert_eq!(normalize_name("   "), "output");
        assert_eq!(normalize_name(".."), "output");
        assert_eq!(normalize_name(&"x".repeat(300)).len(), 100);
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("week 1"), "week_1.json.hsg");
    }

    #[test]
    fn test_load_meta_data_skips_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.json.hsg");
        fs::write(
            &path,
            r#"{"HKQuantityTypeIdentifierBodyMass":[{"sDate":1,"value":70,"unit":"kg"}],
                "metaData":{"creationDate":1700000000000,"profileName":"me","version":"1.0.0","type":"JsonSingleDocExportTarget"},
                "userData":{}}"#,
        )
        .unwrap();

        let profile = HealthProfile::open(&path).unwrap();
        let meta = profile.load_meta_data(false).unwrap();
        assert_eq!(meta.profile_name.as_deref(), Some("me"));
        assert_eq!(meta.creation_date_ms, Some(1_700_000_000_000));
        assert_eq!(meta.version.as_deref(), Some("1.0.0"));
        assert_eq!(meta.kind.as_deref(), Some("JsonSingleDocExportTarget"));
        assert!(meta.creation_date().is_some());
        assert_eq!(profile.file_stem(), "p");
    }

    #[test]
    fn test_load_meta_data_requires_section() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.json.hsg");
        fs::write(&path, r#"{"userData":{}}"#).unwrap();

        let profile = HealthProfile::open(&path).unwrap();
        assert!(profile.load_meta_data(false).is_err());
    }

    #[test]
    fn test_open_missing_profile() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            HealthProfile::open(dir.path().join("nope.json.hsg")),
            Err(Error::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_list_profiles_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["b.json.hsg", "a.json.hsg", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }

        let profiles = list_profiles(dir.path()).unwrap();
        let stems: Vec<_> = profiles.iter().map(HealthProfile::file_stem).collect();
        assert_eq!(stems, vec!["a", "b"]);

        assert!(list_profiles(&dir.path().join("missing")).unwrap().is_empty());
    }
}
