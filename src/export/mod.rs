//! Profile export.
//!
//! - [`config`] - what to export and where
//! - [`target`] - the sink abstraction and its lifecycle
//! - [`memory_target`] / [`stream_target`] - the two sinks
//! - [`exporters`] - record-to-fragment mapping per shape
//! - [`orchestrator`] - the run itself
//!
//! # Example
//!
//! ```ignore
//! use hp::export::{ExportConfiguration, HealthDataExporter, JsonStreamTarget};
//!
//! let config = ExportConfiguration::new("me", "/tmp");
//! let mut target = JsonStreamTarget::to_file(config.output_path(), false);
//! let mut exporter = HealthDataExporter::new(&store, config);
//! let summary = exporter.export(&mut [&mut target])?;
//! ```

pub mod config;
pub mod error;
pub mod exporters;
pub mod memory_target;
pub mod orchestrator;
pub mod stream_target;
pub mod target;

pub use config::{ExportConfiguration, ExportScope};
pub use error::{
    AggregatedExportError, ErrorCollector, RecordError, RecordErrorKind, TransferError,
    failed_type_ids,
};
pub use memory_target::InMemoryTarget;
pub use orchestrator::{ExportState, ExportSummary, HealthDataExporter, TypeSummary};
pub use stream_target::JsonStreamTarget;
pub use target::{ExportTarget, Lifecycle};
