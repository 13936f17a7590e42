//! Health profile CLI - export and import personal health records
//!
//! This crate provides the core functionality for the `hp` CLI tool.
//!
//! # Architecture
//!
//! - [`model`] - Record shapes, units and the record type catalog
//! - [`store`] - The health-data store trait, SQLite and in-memory stores
//! - [`document`] - The profile document and its field keys
//! - [`export`] - Export targets, type exporters and the export orchestrator
//! - [`import`] - Profile decoding and the import orchestrator
//! - [`profile`] - Profile files on disk and their metadata
//! - [`progress`] - Progress events for long-running transfers
//! - [`generate`] - Reproducible sample data
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Path resolution
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod generate;
pub mod import;
pub mod model;
pub mod profile;
pub mod progress;
pub mod store;

pub use error::{Error, Result};
