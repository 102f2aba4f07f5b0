//! Condition predictor boundary
//!
//! The predictor maps a vitals record to a single condition label. How the
//! label is produced is opaque to the rest of the crate: handlers only see
//! the [`ConditionPredictor`] trait, so a fitted model, a remote service
//! or a fixed stub can be swapped in without touching the analyzer.

pub mod artifacts;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::vitals::VitalSigns;

pub use artifacts::{
    ArtifactPredictor, Classifier, LabelEncoder, StandardScaler, CLASSIFIER_FILE,
    LABEL_ENCODER_FILE, SCALER_FILE,
};

/// Opaque label produced by a predictor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionLabel(String);

impl ConditionLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConditionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps vitals to a condition label.
///
/// Implementations hold only read-only state and must be deterministic for
/// a fixed model: the same vitals always yield the same label.
pub trait ConditionPredictor: Send + Sync {
    /// Short identifier used in logs and health output
    fn name(&self) -> &str;

    /// Every label this predictor can return
    fn classes(&self) -> Vec<String>;

    /// Predict the condition for one vitals record
    fn predict(&self, vitals: &VitalSigns) -> Result<ConditionLabel>;
}

/// Predictor that always returns the same label
#[derive(Debug, Clone)]
pub struct StaticPredictor {
    label: ConditionLabel,
}

impl StaticPredictor {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: ConditionLabel::new(label),
        }
    }
}

impl ConditionPredictor for StaticPredictor {
    fn name(&self) -> &str {
        "static"
    }

    fn classes(&self) -> Vec<String> {
        vec![self.label.to_string()]
    }

    fn predict(&self, _vitals: &VitalSigns) -> Result<ConditionLabel> {
        Ok(self.label.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_predictor() {
        let predictor = StaticPredictor::new("Healthy");
        let vitals = VitalSigns::new(30, 22.0, 120, 80, 70, 90);
        assert_eq!(predictor.predict(&vitals).unwrap().as_str(), "Healthy");
        assert_eq!(predictor.classes(), vec!["Healthy".to_string()]);
    }

    #[test]
    fn test_condition_label_serializes_as_string() {
        let json = serde_json::to_string(&ConditionLabel::new("Diabetes")).unwrap();
        assert_eq!(json, "\"Diabetes\"");
    }
}
