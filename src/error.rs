//! Error types for the health profile CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::export::TransferError;
use crate::store::StoreError;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,
    StoreError,

    // Not Found (exit 3)
    ProfileNotFound,

    // Validation (exit 4)
    InvalidArgument,

    // Transfer (exit 6)
    TransferError,
    Cancelled,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::StoreError => "STORE_ERROR",
            Self::ProfileNotFound => "PROFILE_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::TransferError => "TRANSFER_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized
            | Self::AlreadyInitialized
            | Self::DatabaseError
            | Self::StoreError => 2,
            Self::ProfileNotFound => 3,
            Self::InvalidArgument => 4,
            Self::TransferError | Self::Cancelled => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the same command may succeed with corrected input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::InvalidArgument | Self::Cancelled)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in CLI operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `hp init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::ProfileNotFound(_) => ErrorCode::ProfileNotFound,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Store(_) => ErrorCode::StoreError,
            Self::Transfer(TransferError::Cancelled) => ErrorCode::Cancelled,
            Self::Transfer(TransferError::Configuration(_)) => ErrorCode::InvalidArgument,
            Self::Transfer(_) => ErrorCode::TransferError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => Some("Run `hp init` to create the database".to_string()),

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::ProfileNotFound(_) => {
                Some("Use `hp profile list` to see available profiles.".to_string())
            }

            Self::Transfer(TransferError::Configuration(msg)) if msg.contains("exists") => {
                Some("Pass `--overwrite` to replace the existing profile.".to_string())
            }

            Self::Transfer(TransferError::Document(_) | TransferError::Structural(_)) => Some(
                "The profile is not a valid health profile document.".to_string(),
            ),

            Self::InvalidArgument(msg) if msg.contains("days") => {
                Some("Pass a positive day count, e.g. `--days 30`.".to_string())
            }

            Self::Database(_)
            | Self::Store(_)
            | Self::Transfer(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
