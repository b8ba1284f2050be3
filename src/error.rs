//! Error types for filterbot

use std::io;

use thiserror::Error;

use crate::transform::TransformError;

/// Result type alias for filterbot
pub type Result<T> = std::result::Result<T, Error>;

/// filterbot errors
///
/// Whitelist denials and failing filters are not errors; they are reported as
/// [`filterbot_core::FilterResult`] values so a reply can always be sent.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The transform registry could not report its filters
    #[error("Transform registry error: {0}")]
    Registry(#[from] TransformError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Process exit code used by the CLI for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 78, // EX_CONFIG
            Self::Io(_) => 74,     // EX_IOERR
            Self::Registry(_) | Self::Json(_) | Self::Internal(_) => 70, // EX_SOFTWARE
        }
    }
}
