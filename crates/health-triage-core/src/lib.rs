//! Health Triage Core
//!
//! Given six vital-sign measurements, this crate:
//!
//! 1. **Predicts** an overall condition label through a swappable
//!    [`ConditionPredictor`] (a fitted scaler, classifier and label encoder,
//!    or any compatible stand-in).
//! 2. **Analyzes** each parameter against a declarative [`RuleTable`] of
//!    medical ranges, producing one [`Finding`] per out-of-range value with
//!    a remediation suggestion.
//!
//! The two steps are independent. The analyzer is a pure, non-failing
//! function; only the predictor can fail.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use health_triage_core::{ParameterAnalyzer, StaticPredictor, TriageService, VitalSigns};
//!
//! let service = TriageService::new(
//!     Arc::new(StaticPredictor::new("Healthy")),
//!     ParameterAnalyzer::new(),
//! );
//!
//! let result = service
//!     .triage(&VitalSigns::new(30, 22.0, 120, 80, 70, 90))
//!     .unwrap();
//! assert_eq!(result.message(), "All parameters normal");
//! assert!(result.issues().is_empty());
//! ```

pub mod analyzer;
pub mod error;
pub mod predictor;
pub mod triage;
pub mod vitals;

pub use analyzer::{
    default_rules, Analysis, AnalysisResult, Comparison, Finding, Parameter, ParameterAnalyzer,
    RuleTable, Status, ThresholdRule, ABNORMAL_MESSAGE, ALL_NORMAL_MESSAGE,
};
pub use error::{Result, TriageError};
pub use predictor::{
    ArtifactPredictor, Classifier, ConditionLabel, ConditionPredictor, LabelEncoder,
    StandardScaler, StaticPredictor,
};
pub use triage::{TriageFailure, TriageService};
pub use vitals::{VitalSigns, FEATURE_COUNT, FEATURE_NAMES};
