//! Export target abstraction.
//!
//! A target receives the profile document piece by piece:
//!
//! ```text
//! start_export
//!   write_meta_data / write_user_data
//!   (start_write_type  write_record*  end_write_type)*
//! end_export
//! ```
//!
//! [`Lifecycle`] enforces that order for every implementation. Calls out of
//! order fail with [`TransferError::Structural`] instead of corrupting output.

use std::collections::HashSet;

use crate::document::Fragment;
use crate::export::TransferError;

/// A destination for an exported profile.
pub trait ExportTarget {
    /// Kind name written into `metaData.type`.
    fn kind(&self) -> &'static str;

    /// Whether the target's preconditions currently hold.
    fn is_valid(&self) -> bool;

    /// Acquire the sink and open the document.
    ///
    /// # Errors
    ///
    /// Fails if the sink cannot be opened or the export already started.
    fn start_export(&mut self) -> Result<(), TransferError>;

    /// Write the `metaData` section.
    ///
    /// # Errors
    ///
    /// Fails outside an open export, or on a sink error.
    fn write_meta_data(&mut self, fields: Fragment) -> Result<(), TransferError>;

    /// Write the `userData` section.
    ///
    /// # Errors
    ///
    /// Fails outside an open export, or on a sink error.
    fn write_user_data(&mut self, fields: Fragment) -> Result<(), TransferError>;

    /// Open the section for one record type.
    ///
    /// # Errors
    ///
    /// Fails if another section is open or this type was already written.
    fn start_write_type(&mut self, type_id: &str) -> Result<(), TransferError>;

    /// Append one record fragment to the open type section.
    ///
    /// # Errors
    ///
    /// Fails if no type section is open, or on a sink error.
    fn write_record(&mut self, fragment: Fragment) -> Result<(), TransferError>;

    /// Close the open type section. A no-op when none is open.
    ///
    /// # Errors
    ///
    /// Fails outside an open export, or on a sink error.
    fn end_write_type(&mut self) -> Result<(), TransferError>;

    /// Close the document and release the sink.
    ///
    /// # Errors
    ///
    /// Fails if a type section is still open or the sink cannot be finalized.
    fn end_export(&mut self) -> Result<(), TransferError>;

    /// Release the sink after a fatal failure, discarding partial output.
    fn abort(&mut self);
}

/// Where a target is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Open,
    InType(String),
    Closed,
    Aborted,
}

/// Shared lifecycle state machine for export targets.
#[derive(Debug, Default)]
pub struct Lifecycle {
    phase: Phase,
    written: HashSet<String>,
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Whether the target can still run an export.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    /// Idle to Open.
    ///
    /// # Errors
    ///
    /// Fails unless the target is idle.
    pub fn start(&mut self) -> Result<(), TransferError> {
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Open;
                Ok(())
            }
            _ => Err(self.violation("start_export")),
        }
    }

    /// Claim a top-level section while the export is open. Each key once.
    ///
    /// # Errors
    ///
    /// Fails outside the Open phase or on a repeated key.
    pub fn claim_section(&mut self, key: &str) -> Result<(), TransferError> {
        if self.phase != Phase::Open {
            return Err(self.violation(&format!("write {key}")));
        }
        if !self.written.insert(key.to_string()) {
            return Err(TransferError::Structural(format!(
                "section {key} was already written"
            )));
        }
        Ok(())
    }

    /// Open to `InType(type_id)`.
    ///
    /// # Errors
    ///
    /// Fails outside the Open phase or if the type was already written.
    pub fn begin_type(&mut self, type_id: &str) -> Result<(), TransferError> {
        self.claim_section(type_id)?;
        self.phase = Phase::InType(type_id.to_string());
        Ok(())
    }

    /// The open type section.
    ///
    /// # Errors
    ///
    /// Fails unless a type section is open.
    pub fn current_type(&self) -> Result<&str, TransferError> {
        match &self.phase {
            Phase::InType(type_id) => Ok(type_id),
            _ => Err(self.violation("write_record")),
        }
    }

    /// `InType` to Open. Returns the closed type, or `None` if nothing was open.
    ///
    /// # Errors
    ///
    /// Fails before `start_export` or after `end_export`.
    pub fn end_type(&mut self) -> Result<Option<String>, TransferError> {
        match std::mem::take(&mut self.phase) {
            Phase::InType(type_id) => {
                self.phase = Phase::Open;
                Ok(Some(type_id))
            }
            Phase::Open => {
                self.phase = Phase::Open;
                Ok(None)
            }
            other => {
                self.phase = other;
                Err(self.violation("end_write_type"))
            }
        }
    }

    /// Open to Closed.
    ///
    /// # Errors
    ///
    /// Fails unless the export is open with no type section pending.
    pub fn finish(&mut self) -> Result<(), TransferError> {
        match self.phase {
            Phase::Open => {
                self.phase = Phase::Closed;
                Ok(())
            }
            _ => Err(self.violation("end_export")),
        }
    }

    pub fn abort(&mut self) {
        self.phase = Phase::Aborted;
    }

    fn violation(&self, call: &str) -> TransferError {
        let state = match &self.phase {
            Phase::Idle => "before start_export".to_string(),
            Phase::Open => "with no type section open".to_string(),
            Phase::InType(t) => format!("while {t} is open"),
            Phase::Closed => "after end_export".to_string(),
            Phase::Aborted => "after abort".to_string(),
        };
        TransferError::Structural(format!("{call} called {state}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut lc = Lifecycle::new();
        assert!(lc.is_usable());
        lc.start().unwrap();
        lc.claim_section("metaData").unwrap();
        lc.begin_type("A").unwrap();
        assert_eq!(lc.current_type().unwrap(), "A");
        assert_eq!(lc.end_type().unwrap(), Some("A".to_string()));
        lc.finish().unwrap();
        assert!(lc.is_closed());
    }

    #[test]
    fn test_writes_before_start_fail() {
        let mut lc = Lifecycle::new();
        assert!(matches!(lc.begin_type("A"), Err(TransferError::Structural(_))));
        assert!(lc.end_type().is_err());
        assert!(lc.finish().is_err());
    }

    #[test]
    fn test_end_type_without_open_type_is_noop() {
        let mut lc = Lifecycle::new();
        lc.start().unwrap();
        assert_eq!(lc.end_type().unwrap(), None);
        assert_eq!(lc.phase(), &Phase::Open);
    }

    #[test]
    fn test_record_between_types_fails() {
        let mut lc = Lifecycle::new();
        lc.start().unwrap();
        lc.begin_type("A").unwrap();
        lc.end_type().unwrap();
        assert!(lc.current_type().is_err());
    }

    #[test]
    fn test_type_written_once() {
        let mut lc = Lifecycle::new();
        lc.start().unwrap();
        lc.begin_type("A").unwrap();
        lc.end_type().unwrap();
        assert!(lc.begin_type("A").is_err());
    }

    #[test]
    fn test_finish_with_open_type_fails() {
        let mut lc = Lifecycle::new();
        lc.start().unwrap();
        lc.begin_type("A").unwrap();
        let err = lc.finish().unwrap_err();
        assert!(err.to_string().contains("while A is open"));
    }

    #[test]
    fn test_no_writes_after_close() {
        let mut lc = Lifecycle::new();
        lc.start().unwrap();
        lc.finish().unwrap();
        assert!(lc.start().is_err());
        assert!(lc.claim_section("userData").is_err());
        assert!(lc.end_type().is_err());
    }
}
