//! HTTP handlers for the triage service
//!
//! - `routes`: router construction, endpoint handlers and [`ApiError`]
//! - `middleware`: bearer authorization and request logging
//!
//! Successful triage responses are the bare `{condition, message, issues}`
//! or `{message, issues}` objects. Failures use the [`ErrorResponse`]
//! envelope.

pub mod middleware;
pub mod routes;

pub use middleware::{
    request_logging_middleware, require_authorization, Authorizer, RequestId,
    StaticTokenAuthorizer, REQUEST_ID_HEADER,
};
pub use routes::{
    analyze, create_router, health_check, list_rules, metrics_text, predict, root, ApiError,
    ApiFailure, AppState,
};

use health_triage_core::ThresholdRule;
use serde::{Deserialize, Serialize};

/// Error envelope returned by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    pub error: ErrorInfo,
    pub metadata: ResponseMetadata,
}

impl ErrorResponse {
    pub fn new(error: ErrorInfo, request_id: impl Into<String>) -> Self {
        Self {
            success: false,
            error,
            metadata: ResponseMetadata::new(request_id),
        }
    }
}

/// Error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Response metadata for tracing and debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Request identifier, echoed in the `x-request-id` header
    pub request_id: String,
    /// Timestamp of response generation (RFC 3339)
    pub timestamp: String,
    /// Service version
    pub version: String,
}

impl ResponseMetadata {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

/// Body of `GET /rules`
#[derive(Debug, Clone, Serialize)]
pub struct RulesResponse {
    pub count: usize,
    pub rules: Vec<RuleInfo>,
}

/// One rule as listed by `GET /rules`
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    /// Trigger in readable form, e.g. "BMI >= 30"
    pub trigger: String,
    #[serde(flatten)]
    pub rule: ThresholdRule,
}

impl From<&ThresholdRule> for RuleInfo {
    fn from(rule: &ThresholdRule) -> Self {
        Self {
            trigger: rule.describe(),
            rule: rule.clone(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall health status
    pub status: HealthStatus,
    /// Component-level health
    pub components: ComponentHealth,
    /// Predictor identifier
    pub predictor: String,
    /// Labels the predictor can return
    pub classes: Vec<String>,
    /// Rules loaded into the analyzer
    pub rule_count: usize,
    pub uptime_seconds: u64,
    /// Timestamp of health check
    pub timestamp: String,
    /// Service version
    pub version: String,
}

/// Health status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Component-level health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Predictor reports at least one class
    pub predictor: bool,
    /// Analyzer has at least one rule
    pub analyzer: bool,
}

impl ComponentHealth {
    pub fn status(&self) -> HealthStatus {
        if self.predictor && self.analyzer {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_triage_core::{Comparison, Parameter, Status};

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse::new(
            ErrorInfo::new("BAD_REQUEST", "missing field `bmi`"),
            "req-123",
        );
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert!(json["error"].get("details").is_none());
        assert_eq!(json["metadata"]["request_id"], "req-123");
        assert_eq!(json["metadata"]["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_error_info_with_details() {
        let info = ErrorInfo::new("PREDICTION_FAILED", "Prediction failed")
            .with_details(serde_json::json!({ "issues": [] }));
        assert_eq!(info.details.unwrap()["issues"], serde_json::json!([]));
    }

    #[test]
    fn test_rule_info_flattens_rule() {
        let rule = ThresholdRule::new(Parameter::Bmi, Comparison::Ge, 30.0, Status::Obese, "Diet");
        let json = serde_json::to_value(RuleInfo::from(&rule)).unwrap();

        assert_eq!(json["trigger"], "BMI >= 30");
        assert_eq!(json["parameter"], "BMI");
        assert_eq!(json["comparison"], "ge");
        assert_eq!(json["status"], "Obese");
    }

    #[test]
    fn test_component_health_status() {
        let healthy = ComponentHealth {
            predictor: true,
            analyzer: true,
        };
        let degraded = ComponentHealth {
            predictor: true,
            analyzer: false,
        };
        assert_eq!(healthy.status(), HealthStatus::Healthy);
        assert_eq!(degraded.status(), HealthStatus::Degraded);
    }
}
