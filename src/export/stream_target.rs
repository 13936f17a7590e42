//! Streaming export target.
//!
//! Writes the document incrementally: `{`, each section, `[`, comma-separated
//! fragments, `]`, `}`. Only delimiter state is kept in memory, so profiles
//! of any size stream in constant space.
//!
//! [`JsonStreamTarget::to_file`] writes to `<path>.tmp` and renames it over
//! `path` on `end_export`. Abort and drop remove the temp file, so a partial
//! profile never appears at the final path.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::document::{Fragment, keys};
use crate::export::TransferError;
use crate::export::target::{ExportTarget, Lifecycle};

/// Final and temporary paths of a file-backed target.
struct FileDestination<W> {
    path: PathBuf,
    temp_path: PathBuf,
    overwrite: bool,
    committed: bool,
    open: fn(&Path) -> io::Result<W>,
    sync: fn(W) -> io::Result<()>,
}

impl<W> std::fmt::Debug for FileDestination<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDestination")
            .field("path", &self.path)
            .field("temp_path", &self.temp_path)
            .field("overwrite", &self.overwrite)
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}

impl<W> FileDestination<W> {
    fn remove_temp(&self) {
        if self.committed {
            return;
        }
        match fs::remove_file(&self.temp_path) {
            Ok(()) => debug!(path = %self.temp_path.display(), "Removed partial profile"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(
                    path = %self.temp_path.display(),
                    error = %e,
                    "Failed to remove partial profile"
                );
            }
        }
    }
}

fn open_buffered(path: &Path) -> io::Result<BufWriter<File>> {
    File::create(path).map(BufWriter::new)
}

fn sync_buffered(writer: BufWriter<File>) -> io::Result<()> {
    let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
    file.sync_all()
}

/// Streams the profile document to an [`io::Write`] sink.
#[derive(Debug)]
pub struct JsonStreamTarget<W: Write> {
    sink: Option<W>,
    file: Option<FileDestination<W>>,
    lifecycle: Lifecycle,
    first_section: bool,
    first_record: bool,
}

impl JsonStreamTarget<BufWriter<File>> {
    /// Stream to a file acquired at `start_export`.
    pub fn to_file(path: impl Into<PathBuf>, overwrite: bool) -> Self {
        let path = path.into();
        let mut temp = OsString::from(path.as_os_str());
        temp.push(".tmp");
        Self {
            sink: None,
            file: Some(FileDestination {
                path,
                temp_path: PathBuf::from(temp),
                overwrite,
                committed: false,
                open: open_buffered,
                sync: sync_buffered,
            }),
            lifecycle: Lifecycle::new(),
            first_section: true,
            first_record: true,
        }
    }
}

impl<W: Write> JsonStreamTarget<W> {
    /// Stream to an already-open writer.
    pub fn new(writer: W) -> Self {
        Self {
            sink: Some(writer),
            file: None,
            lifecycle: Lifecycle::new(),
            first_section: true,
            first_record: true,
        }
    }

    /// Final path of a file-backed target.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path.as_path())
    }

    /// Recover the writer, e.g. to inspect an in-memory buffer.
    pub fn into_inner(mut self) -> Option<W> {
        self.sink.take()
    }

    fn sink(&mut self) -> Result<&mut W, TransferError> {
        self.sink
            .as_mut()
            .ok_or_else(|| TransferError::Structural("sink is not open".to_string()))
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<(), TransferError> {
        self.sink()?.write_all(bytes)?;
        Ok(())
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), TransferError> {
        let sink = self.sink()?;
        serde_json::to_writer(sink, value).map_err(|e| {
            if e.is_io() {
                TransferError::Sink(e.into())
            } else {
                TransferError::Document(e)
            }
        })
    }

    /// Write `"key":` with the separating comma where needed.
    fn write_section_key(&mut self, key: &str) -> Result<(), TransferError> {
        if self.first_section {
            self.first_section = false;
        } else {
            self.write_raw(b",")?;
        }
        self.write_json(key)?;
        self.write_raw(b":")
    }

    fn acquire(&mut self) -> Result<(), TransferError> {
        if let Some(dest) = &self.file {
            if self.sink.is_none() {
                let writer = (dest.open)(&dest.temp_path)?;
                debug!(path = %dest.temp_path.display(), "Opened profile sink");
                self.sink = Some(writer);
            }
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), TransferError> {
        let Some(dest) = self.file.as_mut() else {
            return Ok(());
        };
        if let Some(writer) = self.sink.take() {
            (dest.sync)(writer)?;
        }
        fs::rename(&dest.temp_path, &dest.path)?;
        dest.committed = true;
        debug!(path = %dest.path.display(), "Committed profile");
        Ok(())
    }

    fn discard(&mut self) {
        if let Some(dest) = &self.file {
            self.sink = None;
            dest.remove_temp();
        }
    }
}

impl<W: Write> ExportTarget for JsonStreamTarget<W> {
    fn kind(&self) -> &'static str {
        keys::SINGLE_DOC_KIND
    }

    fn is_valid(&self) -> bool {
        if !self.lifecycle.is_usable() {
            return false;
        }
        match &self.file {
            None => self.sink.is_some(),
            Some(dest) => {
                let parent_ok = dest
                    .path
                    .parent()
                    .is_none_or(|p| p.as_os_str().is_empty() || p.is_dir());
                parent_ok && (dest.overwrite || !dest.path.exists())
            }
        }
    }

    fn start_export(&mut self) -> Result<(), TransferError> {
        self.lifecycle.start()?;
        self.acquire()?;
        self.write_raw(b"{")
    }

    fn write_meta_data(&mut self, fields: Fragment) -> Result<(), TransferError> {
        self.lifecycle.claim_section(keys::META_DATA)?;
        self.write_section_key(keys::META_DATA)?;
        self.write_json(&fields)
    }

    fn write_user_data(&mut self, fields: Fragment) -> Result<(), TransferError> {
        self.lifecycle.claim_section(keys::USER_DATA)?;
        self.write_section_key(keys::USER_DATA)?;
        self.write_json(&fields)
    }

    fn start_write_type(&mut self, type_id: &str) -> Result<(), TransferError> {
        self.lifecycle.begin_type(type_id)?;
        self.write_section_key(type_id)?;
        self.first_record = true;
        self.write_raw(b"[")
    }

    fn write_record(&mut self, fragment: Fragment) -> Result<(), TransferError> {
        self.lifecycle.current_type()?;
        if self.first_record {
            self.first_record = false;
        } else {
            self.write_raw(b",")?;
        }
        self.write_json(&fragment)
    }

    fn end_write_type(&mut self) -> Result<(), TransferError> {
        if self.lifecycle.end_type()?.is_some() {
            self.write_raw(b"]")?;
        }
        Ok(())
    }

    fn end_export(&mut self) -> Result<(), TransferError> {
        self.lifecycle.finish()?;
        self.write_raw(b"}")?;
        self.sink()?.flush()?;
        self.release()
    }

    fn abort(&mut self) {
        self.lifecycle.abort();
        self.discard();
    }
}

impl<W: Write> Drop for JsonStreamTarget<W> {
    fn drop(&mut self) {
        self.discard();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_sample<W: Write>(target: &mut JsonStreamTarget<W>) {
        target.start_export().unwrap();
        target
            .write_meta_data(Fragment::new().with(keys::PROFILE_NAME, "me"))
            .unwrap();
        target.write_user_data(Fragment::new()).unwrap();
        target.start_write_type("A").unwrap();
        target.write_record(Fragment::new().with(keys::VALUE, 1)).unwrap();
        target.write_record(Fragment::new().with(keys::VALUE, 2)).unwrap();
        target.end_write_type().unwrap();
        target.start_write_type("B").unwrap();
        target.end_write_type().unwrap();
        target.end_export().unwrap();
    }

    #[test]
    fn test_streams_valid_json() {
        let mut target = JsonStreamTarget::new(Vec::new());
        assert!(target.is_valid());
        write_sample(&mut target);

        let bytes = target.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            r#"{"metaData":{"profileName":"me"},"userData":{},"A":[{"value":1},{"value":2}],"B":[]}"#
        );
    }

    #[test]
    fn test_file_target_commits_on_end() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.json.hsg");
        let mut target = JsonStreamTarget::to_file(&path, false);
        assert!(target.is_valid());
        write_sample(&mut target);
        drop(target);

        let parsed: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed["A"].as_array().unwrap().len(), 2);
        assert!(!dir.path().join("p.json.hsg.tmp").exists());
    }

    #[test]
    fn test_file_target_abort_removes_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.json.hsg");
        let mut target = JsonStreamTarget::to_file(&path, false);
        target.start_export().unwrap();
        target.start_write_type("A").unwrap();
        assert!(dir.path().join("p.json.hsg.tmp").exists());

        target.abort();
        assert!(!dir.path().join("p.json.hsg.tmp").exists());
        assert!(!path.exists());
        assert!(!target.is_valid());
    }

    #[test]
    fn test_file_target_drop_removes_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.json.hsg");
        {
            let mut target = JsonStreamTarget::to_file(&path, false);
            target.start_export().unwrap();
        }
        assert!(!dir.path().join("p.json.hsg.tmp").exists());
        assert!(!path.exists());
    }

    #[test]
    fn test_file_target_validity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.json.hsg");
        fs::write(&path, "{}").unwrap();

        assert!(!JsonStreamTarget::to_file(&path, false).is_valid());
        assert!(JsonStreamTarget::to_file(&path, true).is_valid());
        assert!(!JsonStreamTarget::to_file(dir.path().join("missing/p.json.hsg"), true).is_valid());
    }

    #[test]
    fn test_end_export_with_open_type_fails() {
        let mut target = JsonStreamTarget::new(Vec::new());
        target.start_export().unwrap();
        target.start_write_type("A").unwrap();
        assert!(matches!(target.end_export(), Err(TransferError::Structural(_))));
    }
}
