//! Vital-sign input record
//!
//! JSON keys follow the wire format of the public API (`systolicbp`,
//! `heartrate`, ...). Plausibility is not checked here.

use serde::{Deserialize, Serialize};

/// Number of features the predictor consumes
pub const FEATURE_COUNT: usize = 6;

/// Feature names in model training order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "bmi",
    "systolicbp",
    "diastolicbp",
    "heartrate",
    "glucose",
];

/// The six measurements consumed by both the predictor and the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VitalSigns {
    /// Age in years
    pub age: i64,
    /// Body mass index (kg/m²)
    pub bmi: f64,
    /// Systolic blood pressure (mmHg)
    #[serde(rename = "systolicbp")]
    pub systolic_bp: i64,
    /// Diastolic blood pressure (mmHg)
    #[serde(rename = "diastolicbp")]
    pub diastolic_bp: i64,
    /// Heart rate (bpm)
    #[serde(rename = "heartrate")]
    pub heart_rate: i64,
    /// Blood glucose (mg/dL)
    pub glucose: i64,
}

impl VitalSigns {
    pub fn new(
        age: i64,
        bmi: f64,
        systolic_bp: i64,
        diastolic_bp: i64,
        heart_rate: i64,
        glucose: i64,
    ) -> Self {
        Self {
            age,
            bmi,
            systolic_bp,
            diastolic_bp,
            heart_rate,
            glucose,
        }
    }

    /// Raw features in the order the model was trained on.
    ///
    /// The order matches [`FEATURE_NAMES`] and must not be permuted.
    pub fn feature_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age as f64,
            self.bmi,
            self.systolic_bp as f64,
            self.diastolic_bp as f64,
            self.heart_rate as f64,
            self.glucose as f64,
        ]
    }
}
