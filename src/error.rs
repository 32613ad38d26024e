//! Error types for magicboot
//!
//! This module defines all error types used throughout the bootstrap layer.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

/// The primary error type for magicboot operations.
#[derive(Error, Debug)]
pub enum MagicError {
    /// Configuration-related errors (invalid config, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Script text could not be parsed into an instruction tree
    #[error("Parse error: {0}")]
    Parse(String),

    /// Slot dispatch errors (wrong execution kind, provider failures, etc.)
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// A slot name was registered twice
    #[error("Slot collision: {0}")]
    Collision(String),

    /// A failure raised from inside a running script, carrying response
    /// metadata the exception pipeline understands.
    #[error("{message}")]
    Script {
        /// Human-readable failure description.
        message: String,
        /// HTTP status the response should carry.
        status: u16,
        /// Whether the message may be exposed verbatim to clients.
        public: bool,
        /// Optional name of the input field that caused the failure.
        field: Option<String>,
    },

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Resource not found (slots, folders, scripts, etc.)
    #[error("Not found: {0}")]
    NotFound(String),
}

impl MagicError {
    /// Construct a script failure with response metadata.
    pub fn script(message: impl Into<String>, status: u16, public: bool) -> Self {
        MagicError::Script {
            message: message.into(),
            status,
            public,
            field: None,
        }
    }

    /// Attach a field name to a script failure. No-op for other variants.
    pub fn with_field(self, field: impl Into<String>) -> Self {
        match self {
            MagicError::Script {
                message,
                status,
                public,
                ..
            } => MagicError::Script {
                message,
                status,
                public,
                field: Some(field.into()),
            },
            other => other,
        }
    }
}

/// A specialized `Result` type for magicboot operations.
pub type Result<T> = std::result::Result<T, MagicError>;
