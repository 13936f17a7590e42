//! Profile import.
//!
//! [`ProfileImporter`] reads a profile back, decodes every type section into
//! records and writes them into a [`HealthStore`](crate::store::HealthStore)
//! in chunks. Problems with a single type are collected and reported in the
//! [`ImportSummary`]; the run moves on to the next type.

pub mod decode;
pub mod importer;

pub use decode::decode_record;
pub use importer::{IMPORT_CHUNK_SIZE, ImportSummary, ProfileImporter, TypeImport};
