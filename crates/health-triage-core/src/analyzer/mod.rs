//! Rule-based parameter analyzer
//!
//! Runs a vitals record through every row of a [`RuleTable`] and collects
//! the resulting findings. Analysis is a pure function of its input: it never
//! fails, never touches shared state, and reports at most one finding per
//! parameter.

pub mod rules;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;
use std::fmt;

use crate::predictor::ConditionLabel;
use crate::vitals::VitalSigns;
pub use rules::{default_rules, Comparison, Parameter, RuleTable, Status, ThresholdRule};

/// Message reported when no parameter is out of range
pub const ALL_NORMAL_MESSAGE: &str = "All parameters normal";

/// Message reported when at least one parameter is out of range
pub const ABNORMAL_MESSAGE: &str = "Some parameters are abnormal";

/// One out-of-range parameter
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct Finding {
    pub parameter: Parameter,
    /// The reading as `f64`; integer vitals beyond 2^53 lose precision
    pub value: f64,
    pub status: Status,
    pub suggestion: String,
}

impl Finding {
    pub fn new(
        parameter: Parameter,
        value: f64,
        status: Status,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            parameter,
            value,
            status,
            suggestion: suggestion.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} = {}: {}",
            self.status, self.parameter, self.value, self.suggestion
        )
    }
}

/// Findings for one vitals record.
///
/// The summary message is derived from the findings on demand and is never
/// stored alongside them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Analysis {
    issues: Vec<Finding>,
}

impl Analysis {
    pub fn new(issues: Vec<Finding>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[Finding] {
        &self.issues
    }

    pub fn is_normal(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn message(&self) -> &'static str {
        if self.is_normal() {
            ALL_NORMAL_MESSAGE
        } else {
            ABNORMAL_MESSAGE
        }
    }
}

impl Serialize for Analysis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Analysis", 2)?;
        state.serialize_field("message", self.message())?;
        state.serialize_field("issues", &self.issues)?;
        state.end()
    }
}

/// Full triage response: predicted condition plus parameter findings
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub condition: ConditionLabel,
    pub analysis: Analysis,
}

impl AnalysisResult {
    pub fn new(condition: ConditionLabel, analysis: Analysis) -> Self {
        Self {
            condition,
            analysis,
        }
    }

    pub fn message(&self) -> &'static str {
        self.analysis.message()
    }

    pub fn issues(&self) -> &[Finding] {
        self.analysis.issues()
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AnalysisResult", 3)?;
        state.serialize_field("condition", &self.condition)?;
        state.serialize_field("message", self.message())?;
        state.serialize_field("issues", self.issues())?;
        state.end()
    }
}

/// Evaluates vitals against a rule table
#[derive(Debug, Clone)]
pub struct ParameterAnalyzer {
    table: RuleTable,
}

impl Default for ParameterAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterAnalyzer {
    /// Analyzer over the default medical ranges
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    /// Analyzer over a custom table
    pub fn with_rules(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.table
    }

    /// Evaluate every rule and return the findings in parameter order.
    ///
    /// A rule whose parameter already produced a finding is skipped, so the
    /// first matching row per parameter wins.
    pub fn analyze(&self, vitals: &VitalSigns) -> Vec<Finding> {
        let mut findings: Vec<Finding> = Vec::new();

        for rule in self.table.rules() {
            if findings.iter().any(|f| f.parameter == rule.parameter) {
                continue;
            }
            if let Some(finding) = rule.evaluate(vitals) {
                tracing::trace!(rule = %rule.describe(), value = finding.value, "rule matched");
                findings.push(finding);
            }
        }

        // stable: rows for the same parameter keep table order
        findings.sort_by_key(|f| f.parameter);
        findings
    }

    /// Analyze and wrap the findings with their derived message
    pub fn assess(&self, vitals: &VitalSigns) -> Analysis {
        Analysis::new(self.analyze(vitals))
    }
}
