//! Unified error handling for PiControl
//!
//! This crate provides a single error type used across all PiControl components.
//! It uses thiserror for ergonomic error definitions with proper Display and Error trait impls.

use std::io;
use std::path::PathBuf;

/// Result type alias using PicontrolError
pub type Result<T> = std::result::Result<T, PicontrolError>;

/// Unified error type for all PiControl operations
#[derive(thiserror::Error, Debug)]
pub enum PicontrolError {
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

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// The stored config file is not valid JSON. Surfaced to the caller of
    /// `load()` rather than silently replaced with the template.
    #[error("Config file {path} is not valid JSON: {source}")]
    ConfigCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write config file {path}: {reason}")]
    ConfigWrite {
        path: PathBuf,
        reason: String,
    },

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
    // Hardware Access Errors
    // ============================================================================
    /// No temperature source could be read this cycle. The control loop keeps
    /// its previous state when it sees this.
    #[error("Temperature sensor unavailable: {reason}")]
    SensorUnavailable {
        reason: String,
    },

    #[error("Failed to read temperature from {path}: {reason}")]
    TemperatureRead {
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to drive fan relay via {path}: {reason}")]
    ActuatorWrite {
        path: PathBuf,
        reason: String,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Generic(String),
}

impl PicontrolError {
    /// Create a generic error from a string
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a sensor-unavailable error from a string
    pub fn sensor(reason: impl Into<String>) -> Self {
        Self::SensorUnavailable {
            reason: reason.into(),
        }
    }
}

// Allow converting from String to PicontrolError
impl From<String> for PicontrolError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

// Allow converting from &str to PicontrolError
impl From<&str> for PicontrolError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}
