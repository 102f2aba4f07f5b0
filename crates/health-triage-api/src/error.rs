//! Error types for the service binary
//!
//! Covers configuration loading, input files, server startup and anything
//! the triage core reports. HTTP handlers use [`crate::handler::ApiError`].

use health_triage_core::TriageError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

/// Main error type for service operations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Invalid input data or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// Configuration file could not be parsed or is inconsistent
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Output could not be serialized
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Error raised by the triage core
    #[error(transparent)]
    Triage(#[from] TriageError),

    /// Metrics registry failure
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// Listener or server failure
    #[error("Server error: {0}")]
    ServerError(String),
}

impl ServiceError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ServiceError::InvalidInput(msg.into())
    }

    pub fn file_error(msg: impl Into<String>) -> Self {
        ServiceError::FileError(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        ServiceError::ConfigError(msg.into())
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        match self {
            ServiceError::InvalidInput(_)
            | ServiceError::FileError(_)
            | ServiceError::ConfigError(_) => true,
            ServiceError::Triage(err) => err.is_user_error(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::FileError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for ServiceError {
    fn from(err: serde_yaml::Error) -> Self {
        ServiceError::SerializationError(format!("YAML error: {}", err))
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
