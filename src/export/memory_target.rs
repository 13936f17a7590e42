//! Export target that builds the whole document in memory.

use crate::document::{Fragment, ProfileDocument, keys};
use crate::export::TransferError;
use crate::export::target::{ExportTarget, Lifecycle};

/// Accumulates a [`ProfileDocument`]. Used for tests and small profiles.
#[derive(Debug, Default)]
pub struct InMemoryTarget {
    document: ProfileDocument,
    lifecycle: Lifecycle,
}

impl InMemoryTarget {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished document.
    ///
    /// # Errors
    ///
    /// Fails until `end_export` has succeeded.
    pub fn materialize(&self) -> Result<&ProfileDocument, TransferError> {
        if self.lifecycle.is_closed() {
            Ok(&self.document)
        } else {
            Err(TransferError::Structural(
                "materialize called before end_export".to_string(),
            ))
        }
    }

    /// The finished document as JSON text.
    ///
    /// # Errors
    ///
    /// Fails until `end_export` has succeeded.
    pub fn json_string(&self) -> Result<String, TransferError> {
        let bytes = self.materialize()?.serialize()?;
        String::from_utf8(bytes).map_err(|e| TransferError::Structural(e.to_string()))
    }
}

impl ExportTarget for InMemoryTarget {
    fn kind(&self) -> &'static str {
        keys::SINGLE_DOC_KIND
    }

    fn is_valid(&self) -> bool {
        self.lifecycle.is_usable()
    }

    fn start_export(&mut self) -> Result<(), TransferError> {
        self.lifecycle.start()
    }

    fn write_meta_data(&mut self, fields: Fragment) -> Result<(), TransferError> {
        self.lifecycle.claim_section(keys::META_DATA)?;
        for (key, value) in fields.iter() {
            self.document.set_meta_data_field(key, value.clone());
        }
        Ok(())
    }

    fn write_user_data(&mut self, fields: Fragment) -> Result<(), TransferError> {
        self.lifecycle.claim_section(keys::USER_DATA)?;
        for (key, value) in fields.iter() {
            self.document.set_user_data_field(key, value.clone());
        }
        Ok(())
    }

    fn start_write_type(&mut self, type_id: &str) -> Result<(), TransferError> {
        self.lifecycle.begin_type(type_id)?;
        self.document.begin_type_section(type_id)?;
        Ok(())
    }

    fn write_record(&mut self, fragment: Fragment) -> Result<(), TransferError> {
        let type_id = self.lifecycle.current_type()?;
        self.document.append_record(type_id, fragment)?;
        Ok(())
    }

    fn end_write_type(&mut self) -> Result<(), TransferError> {
        if let Some(type_id) = self.lifecycle.end_type()? {
            self.document.end_type_section(&type_id)?;
        }
        Ok(())
    }

    fn end_export(&mut self) -> Result<(), TransferError> {
        self.lifecycle.finish()
    }

    fn abort(&mut self) {
        self.lifecycle.abort();
    }
}
