//! Unified error handling for garage-envoy
//!
//! This crate provides a single error type used across all garage-envoy
//! components. It uses thiserror for ergonomic error definitions with proper
//! Display and Error trait impls.

use std::io;
use std::path::PathBuf;

/// Result type alias using GarageError
pub type Result<T> = std::result::Result<T, GarageError>;

/// Unified error type for all garage-envoy operations
#[derive(thiserror::Error, Debug)]
pub enum GarageError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // ============================================================================
    // Hardware Access Errors
    // ============================================================================
    #[error("GPIO error on pin {pin}: {reason}")]
    Gpio {
        pin: u8,
        reason: String,
    },

    #[error("No such pin: {0}")]
    UnknownPin(u8),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Generic(String),
}

impl GarageError {
    /// Create a generic error from a string
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a GPIO error for a pin
    pub fn gpio(pin: u8, reason: impl Into<String>) -> Self {
        Self::Gpio {
            pin,
            reason: reason.into(),
        }
    }
}

// Allow converting from String to GarageError
impl From<String> for GarageError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

// Allow converting from &str to GarageError
impl From<&str> for GarageError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}
