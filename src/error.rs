//! Error types for redikv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RediError
pub type Result<T> = std::result::Result<T, RediError>;

/// Unified error type for redikv operations
#[derive(Debug, Error)]
pub enum RediError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Frame Errors
    // -------------------------------------------------------------------------
    #[error("Frame truncated: needed {needed} bytes, {available} available")]
    FrameTruncated { needed: usize, available: usize },

    #[error("Frame malformed: {0}")]
    FrameMalformed(String),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Invalid data: {0}")]
    DataInvalid(String),

    #[error("Decode error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Dispatch Errors
    // -------------------------------------------------------------------------
    #[error("Internal error: {0}")]
    Internal(String),

    // -------------------------------------------------------------------------
    // Client Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for RediError {
    fn from(err: serde_json::Error) -> Self {
        RediError::Decode(err.to_string())
    }
}
