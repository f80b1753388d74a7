//! Error types for jvcprojector
//!
//! Provides a unified error type for all device operations.

use thiserror::Error;

/// Result type alias using ProjectorError
pub type Result<T> = std::result::Result<T, ProjectorError>;

/// Unified error type for projector operations
#[derive(Debug, Error)]
pub enum ProjectorError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Operation timed out")]
    Timeout,

    #[error("Connection closed by device")]
    ConnectionClosed,

    #[error("Connection refused")]
    ConnectionRefused,

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("Connect failed: {0}")]
    ConnectFailure(String),

    #[error("Authentication failed")]
    Auth,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProjectorError {
    /// True for a per-operation I/O timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProjectorError::Timeout)
    }
}
