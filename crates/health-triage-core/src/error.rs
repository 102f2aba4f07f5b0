//! Error types for the triage core
//!
//! Assessing vitals never fails. Errors come from the input boundary, from
//! building a rule table, or from the predictor.

use thiserror::Error;

/// Main error type for triage operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TriageError {
    /// A required vital is missing or non-numeric
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A threshold rule cannot be added to a rule table
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Predictor artifacts are missing, malformed, or incompatible
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The predictor failed during inference on well-formed input
    #[error("Prediction failed: {0}")]
    PredictionFailure(String),
}

impl TriageError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        TriageError::InvalidInput(msg.into())
    }

    /// Create an invalid rule error
    pub fn invalid_rule(msg: impl Into<String>) -> Self {
        TriageError::InvalidRule(msg.into())
    }

    /// Create a model unavailable error
    pub fn model_unavailable(msg: impl Into<String>) -> Self {
        TriageError::ModelUnavailable(msg.into())
    }

    /// Create a prediction failure error
    pub fn prediction_failure(msg: impl Into<String>) -> Self {
        TriageError::PredictionFailure(msg.into())
    }

    /// Check if this is a caller-side error (vs server-side)
    pub fn is_user_error(&self) -> bool {
        matches!(self, TriageError::InvalidInput(_))
    }
}

/// Result type alias for triage operations
pub type Result<T> = std::result::Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TriageError::ModelUnavailable("scaler.json missing".to_string());
        assert_eq!(err.to_string(), "Model unavailable: scaler.json missing");
    }

    #[test]
    fn test_is_user_error() {
        assert!(TriageError::invalid_input("missing bmi").is_user_error());
        assert!(!TriageError::model_unavailable("test").is_user_error());
        assert!(!TriageError::prediction_failure("test").is_user_error());
        assert!(!TriageError::invalid_rule("test").is_user_error());
    }
}
