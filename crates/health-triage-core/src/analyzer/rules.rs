//! Declarative threshold rules
//!
//! A rule is one row of data: which parameter it reads, how the reading is
//! compared against the threshold, and which status and suggestion a match
//! produces. The analyzer evaluates every row the same way, so a new check
//! is a new row and never a new branch.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Finding;
use crate::error::{Result, TriageError};
use crate::vitals::VitalSigns;

/// The vital sign a rule reads.
///
/// Declaration order is the order findings are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "BMI", alias = "bmi")]
    Bmi,
    #[serde(rename = "Systolic BP", alias = "systolic_bp", alias = "systolicbp")]
    SystolicBp,
    #[serde(rename = "Diastolic BP", alias = "diastolic_bp", alias = "diastolicbp")]
    DiastolicBp,
    #[serde(rename = "Heart Rate", alias = "heart_rate", alias = "heartrate")]
    HeartRate,
    #[serde(rename = "Blood Sugar", alias = "glucose")]
    Glucose,
    #[serde(rename = "Age", alias = "age")]
    Age,
}

impl Parameter {
    /// Human-readable label used in findings
    pub fn label(&self) -> &'static str {
        match self {
            Parameter::Bmi => "BMI",
            Parameter::SystolicBp => "Systolic BP",
            Parameter::DiastolicBp => "Diastolic BP",
            Parameter::HeartRate => "Heart Rate",
            Parameter::Glucose => "Blood Sugar",
            Parameter::Age => "Age",
        }
    }

    /// Read this parameter from a vitals record
    pub fn reading(&self, vitals: &VitalSigns) -> f64 {
        match self {
            Parameter::Bmi => vitals.bmi,
            Parameter::SystolicBp => vitals.systolic_bp as f64,
            Parameter::DiastolicBp => vitals.diastolic_bp as f64,
            Parameter::HeartRate => vitals.heart_rate as f64,
            Parameter::Glucose => vitals.glucose as f64,
            Parameter::Age => vitals.age as f64,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity label attached to a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    High,
    Low,
    Obese,
    Underweight,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::High => write!(f, "High"),
            Status::Low => write!(f, "Low"),
            Status::Obese => write!(f, "Obese"),
            Status::Underweight => write!(f, "Underweight"),
        }
    }
}

/// How a reading is compared against a rule's threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// reading < threshold
    #[serde(alias = "<")]
    Lt,
    /// reading <= threshold
    #[serde(alias = "<=")]
    Le,
    /// reading > threshold
    #[serde(alias = ">")]
    Gt,
    /// reading >= threshold
    #[serde(alias = ">=")]
    Ge,
}

impl Comparison {
    /// Apply the comparison. Any comparison involving NaN is false.
    pub fn matches(&self, reading: f64, threshold: f64) -> bool {
        match self {
            Comparison::Lt => reading < threshold,
            Comparison::Le => reading <= threshold,
            Comparison::Gt => reading > threshold,
            Comparison::Ge => reading >= threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One row of the rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdRule {
    pub parameter: Parameter,
    pub comparison: Comparison,
    pub threshold: f64,
    pub status: Status,
    pub suggestion: String,
}

impl ThresholdRule {
    pub fn new(
        parameter: Parameter,
        comparison: Comparison,
        threshold: f64,
        status: Status,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            parameter,
            comparison,
            threshold,
            status,
            suggestion: suggestion.into(),
        }
    }

    /// Evaluate the row against a vitals record
    pub fn evaluate(&self, vitals: &VitalSigns) -> Option<Finding> {
        let reading = self.parameter.reading(vitals);
        if self.comparison.matches(reading, self.threshold) {
            Some(Finding::new(
                self.parameter,
                reading,
                self.status,
                self.suggestion.clone(),
            ))
        } else {
            None
        }
    }

    /// Describe the trigger, e.g. "BMI >= 30"
    pub fn describe(&self) -> String {
        format!("{} {} {}", self.parameter, self.comparison, self.threshold)
    }

    fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(TriageError::invalid_rule(format!(
                "rule '{}' has a non-finite threshold",
                self.describe()
            )));
        }
        if self.suggestion.trim().is_empty() {
            return Err(TriageError::invalid_rule(format!(
                "rule '{}' has an empty suggestion",
                self.describe()
            )));
        }
        Ok(())
    }
}

/// Ordered collection of threshold rules
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleTable {
    rules: Vec<ThresholdRule>,
}

impl RuleTable {
    /// An empty table
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule at the end of the table
    pub fn push(&mut self, rule: ThresholdRule) -> Result<()> {
        rule.validate()?;
        self.rules.push(rule);
        Ok(())
    }

    /// Builder-style append
    pub fn with_rule(mut self, rule: ThresholdRule) -> Result<Self> {
        self.push(rule)?;
        Ok(self)
    }

    /// Append several rules, stopping at the first invalid one
    pub fn extend(&mut self, rules: impl IntoIterator<Item = ThresholdRule>) -> Result<()> {
        for rule in rules {
            self.push(rule)?;
        }
        Ok(())
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The medically-motivated default ranges
pub fn default_rules() -> RuleTable {
    use Comparison::*;
    use Parameter::*;

    let rows = [
        ThresholdRule::new(
            Bmi,
            Lt,
            18.5,
            Status::Underweight,
            "Increase calorie intake with nutrient-dense foods and consult a dietitian.",
        ),
        ThresholdRule::new(
            Bmi,
            Ge,
            30.0,
            Status::Obese,
            "Adopt a balanced, calorie-controlled diet and aim for at least 150 minutes of activity per week.",
        ),
        ThresholdRule::new(
            SystolicBp,
            Gt,
            140.0,
            Status::High,
            "Reduce salt intake and consult a doctor about managing high blood pressure.",
        ),
        ThresholdRule::new(
            SystolicBp,
            Lt,
            90.0,
            Status::Low,
            "Stay hydrated and stand up slowly; see a doctor if you feel dizzy or faint.",
        ),
        ThresholdRule::new(
            DiastolicBp,
            Gt,
            90.0,
            Status::High,
            "Limit alcohol and caffeine and monitor your blood pressure regularly.",
        ),
        ThresholdRule::new(
            DiastolicBp,
            Lt,
            60.0,
            Status::Low,
            "Increase fluid intake and consult a doctor if fatigue or dizziness persists.",
        ),
        ThresholdRule::new(
            HeartRate,
            Gt,
            100.0,
            Status::High,
            "Avoid stimulants and seek medical advice if a rapid heart rate persists.",
        ),
        ThresholdRule::new(
            HeartRate,
            Lt,
            60.0,
            Status::Low,
            "Consult a doctor, especially if a slow heart rate comes with dizziness or fatigue.",
        ),
        ThresholdRule::new(
            Glucose,
            Gt,
            125.0,
            Status::High,
            "Cut back on sugar and refined carbohydrates and ask a doctor about diabetes screening.",
        ),
        ThresholdRule::new(
            Glucose,
            Lt,
            70.0,
            Status::Low,
            "Eat a fast-acting carbohydrate snack and consult a doctor if low blood sugar recurs.",
        ),
    ];

    RuleTable { rules: rows.to_vec() }
}
