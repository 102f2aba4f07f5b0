//! Triage service: predictor plus analyzer
//!
//! The two components run independently. When prediction fails the analyzer
//! result is still computed and travels with the error, so callers can
//! decide whether to surface it.

use std::sync::Arc;
use thiserror::Error;

use crate::analyzer::{Analysis, AnalysisResult, ParameterAnalyzer};
use crate::error::TriageError;
use crate::predictor::ConditionPredictor;
use crate::vitals::VitalSigns;

/// Prediction failed; the independent analysis is attached
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct TriageFailure {
    pub error: TriageError,
    pub analysis: Analysis,
}

/// Immutable handle shared by every request
#[derive(Clone)]
pub struct TriageService {
    predictor: Arc<dyn ConditionPredictor>,
    analyzer: Arc<ParameterAnalyzer>,
}

impl TriageService {
    pub fn new(predictor: Arc<dyn ConditionPredictor>, analyzer: ParameterAnalyzer) -> Self {
        Self {
            predictor,
            analyzer: Arc::new(analyzer),
        }
    }

    pub fn predictor(&self) -> &dyn ConditionPredictor {
        self.predictor.as_ref()
    }

    pub fn analyzer(&self) -> &ParameterAnalyzer {
        &self.analyzer
    }

    /// Rules only, no prediction
    pub fn analyze(&self, vitals: &VitalSigns) -> Analysis {
        self.analyzer.assess(vitals)
    }

    /// Predict the condition and analyze every parameter
    pub fn triage(&self, vitals: &VitalSigns) -> Result<AnalysisResult, TriageFailure> {
        let analysis = self.analyzer.assess(vitals);

        match self.predictor.predict(vitals) {
            Ok(condition) => Ok(AnalysisResult::new(condition, analysis)),
            Err(error) => {
                tracing::error!(
                    predictor = self.predictor.name(),
                    error = %error,
                    "Prediction failed"
                );
                Err(TriageFailure { error, analysis })
            }
        }
    }
}

impl std::fmt::Debug for TriageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriageService")
            .field("predictor", &self.predictor.name())
            .field("rules", &self.analyzer.rules().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ABNORMAL_MESSAGE;
    use crate::error::Result;
    use crate::predictor::{ConditionLabel, StaticPredictor};

    struct BrokenPredictor;

    impl ConditionPredictor for BrokenPredictor {
        fn name(&self) -> &str {
            "broken"
        }

        fn classes(&self) -> Vec<String> {
            Vec::new()
        }

        fn predict(&self, _vitals: &VitalSigns) -> Result<ConditionLabel> {
            Err(TriageError::prediction_failure("weights corrupted"))
        }
    }

    #[test]
    fn test_triage_merges_outputs() {
        let service = TriageService::new(
            Arc::new(StaticPredictor::new("Hypertension")),
            ParameterAnalyzer::new(),
        );
        let result = service
            .triage(&VitalSigns::new(45, 32.0, 150, 95, 110, 140))
            .unwrap();

        assert_eq!(result.condition.as_str(), "Hypertension");
        assert_eq!(result.issues().len(), 5);
        assert_eq!(result.message(), ABNORMAL_MESSAGE);
    }

    #[test]
    fn test_prediction_failure_keeps_analysis() {
        let service = TriageService::new(Arc::new(BrokenPredictor), ParameterAnalyzer::new());
        let failure = service
            .triage(&VitalSigns::new(25, 17.0, 85, 55, 55, 65))
            .unwrap_err();

        assert!(matches!(failure.error, TriageError::PredictionFailure(_)));
        assert_eq!(failure.analysis.issues().len(), 5);
        assert_eq!(failure.to_string(), "Prediction failed: weights corrupted");
    }
}
