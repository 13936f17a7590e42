//! Export configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::export::TransferError;
use crate::profile::output_file_name;
use crate::store::ProvenanceFilter;

/// Which records qualify for export, by provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportScope {
    /// Every accessible record.
    #[default]
    All,
    /// Records this application wrote, generated or imported.
    AddedByApp,
    /// Records this application generated, excluding imports.
    GeneratedByApp,
}

impl ExportScope {
    /// Store filter selecting the records of this scope.
    #[must_use]
    pub const fn provenance_filter(self) -> ProvenanceFilter {
        match self {
            Self::All => ProvenanceFilter::Any,
            Self::AddedByApp => ProvenanceFilter::OwnedByApp,
            Self::GeneratedByApp => ProvenanceFilter::GeneratedByApp,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::AddedByApp => "added_by_app",
            Self::GeneratedByApp => "generated_by_app",
        }
    }
}

impl fmt::Display for ExportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProvenanceFilter {
    /// Filter for an export scope.
    #[must_use]
    pub const fn for_scope(scope: ExportScope) -> Self {
        scope.provenance_filter()
    }
}

/// Settings for one export run. Not changed once the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfiguration {
    pub scope: ExportScope,
    pub profile_name: String,
    pub output_dir: PathBuf,
    pub overwrite_if_exists: bool,
    pub export_uuids: bool,
}

impl ExportConfiguration {
    /// Configuration with the default scope, writing identifiers, no overwrite.
    #[must_use]
    pub fn new(profile_name: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            scope: ExportScope::All,
            profile_name: profile_name.into(),
            output_dir: output_dir.into(),
            overwrite_if_exists: false,
            export_uuids: true,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: ExportScope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite_if_exists = overwrite;
        self
    }

    #[must_use]
    pub fn with_export_uuids(mut self, export_uuids: bool) -> Self {
        self.export_uuids = export_uuids;
        self
    }

    /// `<output_dir>/<normalized profile name>.json.hsg`.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(output_file_name(&self.profile_name))
    }

    /// Check the configuration before any I/O.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Configuration` describing the first violation.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.profile_name.trim().is_empty() {
            return Err(TransferError::Configuration(
                "profile name must not be empty".to_string(),
            ));
        }
        if !self.output_dir.is_dir() {
            return Err(TransferError::Configuration(format!(
                "output directory {} does not exist",
                self.output_dir.display()
            )));
        }
        let path = self.output_path();
        if path_exists(&path) && !self.overwrite_if_exists {
            return Err(TransferError::Configuration(format!(
                "{} already exists (use --overwrite)",
                path.display()
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

fn path_exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(true)
}
