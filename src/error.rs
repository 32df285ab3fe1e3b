//! Error types for photo-frame operations.

use thiserror::Error;

/// Primary error type for gallery operations.
#[derive(Error, Debug)]
pub enum FrameError {
    // Ingestion errors
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Image file not found: {path}")]
    ImageNotFound { path: String },

    #[error("Failed to encode image: {0}")]
    Encode(String),

    // Import errors
    #[error("Invalid gallery document: {reason}")]
    Validation {
        reason: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Durable storage errors
    #[error("Storage error while trying to {op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage unavailable at {path}: {source}")]
    StorageIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // Display errors
    #[error("Display slot not found: {slot}")]
    SlotNotFound { slot: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl FrameError {
    /// Wraps a SQLite failure with the operation that triggered it.
    pub const fn storage(op: &'static str, source: rusqlite::Error) -> Self {
        Self::Storage { op, source }
    }

    /// Builds a validation error from any displayable reason.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
            source: None,
        }
    }

    /// Rejects a document that is not JSON at all, keeping the parser error.
    pub fn malformed_document(source: serde_json::Error) -> Self {
        Self::Validation {
            reason: format!("not valid JSON: {source}"),
            source: Some(source),
        }
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Decode(_)
                | Self::ImageNotFound { .. }
                | Self::Validation { .. }
                | Self::SlotNotFound { .. }
                | Self::ConfigNotFound { .. }
                | Self::ConfigParse(_)
                | Self::ConfigInvalid(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Decode(_) => Some("Use a PNG, JPEG, GIF, BMP or WebP image"),
            Self::Validation { .. } => {
                Some("Use a file produced by `pf export` (array of {id, encodedImage})")
            }
            Self::ConfigNotFound { .. } => Some("Run: pf config to see the expected location"),
            Self::SlotNotFound { .. } => Some("Check the `slots` list in your configuration"),
            _ => None,
        }
    }

    /// Short machine-readable error code used in robot output.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_error",
            Self::ImageNotFound { .. } => "image_not_found",
            Self::Encode(_) => "encode_error",
            Self::Validation { .. } => "validation_error",
            Self::Storage { .. } | Self::StorageUnavailable(_) | Self::StorageIo { .. } => {
                "storage_error"
            }
            Self::SlotNotFound { .. } => "slot_not_found",
            Self::ConfigNotFound { .. } => "config_not_found",
            Self::ConfigParse(_) => "config_parse_error",
            Self::ConfigInvalid(_) => "config_invalid",
            Self::Io(_) => "io_error",
            Self::Other(_) => "error",
        }
    }
}

/// Convenience type alias for Results using FrameError.
pub type Result<T> = std::result::Result<T, FrameError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| FrameError::Other(format!("{}: {e}", f().into())))
    }
}
