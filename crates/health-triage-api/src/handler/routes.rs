//! Route definitions for the triage service
//!
//! - GET / - liveness message
//! - POST /predict - condition plus parameter findings (authorized)
//! - POST /analyze - parameter findings only (authorized)
//!
//! Both triage routes also answer with a trailing slash.
//! - GET /rules - the active threshold table
//! - GET /health - component health and uptime
//! - GET /metrics - Prometheus text format (when enabled)

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use health_triage_core::{Analysis, AnalysisResult, TriageError, TriageFailure, TriageService, VitalSigns};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use super::middleware::{
    error_envelope_middleware, request_logging_middleware, require_authorization, Authorizer,
    RequestId,
};
use super::{
    ComponentHealth, ErrorInfo, ErrorResponse, HealthResponse, RootResponse, RuleInfo,
    RulesResponse,
};
use crate::config::ServiceConfig;
use crate::telemetry::TriageMetrics;

/// Message returned by `GET /`
pub const ROOT_MESSAGE: &str = "Backend is working!";

/// State shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub service: TriageService,
    pub metrics: Arc<TriageMetrics>,
    pub authorizer: Arc<dyn Authorizer>,
    /// Start time for uptime calculation
    pub start_time: Instant,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.service)
            .field("authorizer_enabled", &self.authorizer.is_enabled())
            .field("start_time", &self.start_time)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        service: TriageService,
        metrics: Arc<TriageMetrics>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            service,
            metrics,
            authorizer,
            start_time: Instant::now(),
        }
    }
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    MethodNotAllowed(String),
    RequestTimeout(String),
    PayloadTooLarge(String),
    UnsupportedMediaType(String),
    /// The predictor failed; the analysis is still reported
    PredictionFailed { message: String, analysis: Analysis },
    InternalError(String),
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            ApiError::RequestTimeout(_) => "REQUEST_TIMEOUT",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ApiError::PredictionFailed { .. } => "PREDICTION_FAILED",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RequestTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PredictionFailed { .. } | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Attach the id of the request this error answers
    pub fn for_request(self, request_id: &RequestId) -> ApiFailure {
        ApiFailure {
            request_id: request_id.clone(),
            error: self,
        }
    }

    fn into_error_info(self) -> ErrorInfo {
        let code = self.error_code();
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::MethodNotAllowed(msg)
            | ApiError::RequestTimeout(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::UnsupportedMediaType(msg)
            | ApiError::InternalError(msg) => ErrorInfo::new(code, msg),
            ApiError::PredictionFailed { message, analysis } => ErrorInfo::new(code, message)
                .with_details(serde_json::json!({
                    "message": analysis.message(),
                    "issues": analysis.issues(),
                })),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(message),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiError::UnsupportedMediaType(message),
            _ => ApiError::BadRequest(message),
        }
    }
}

impl From<TriageFailure> for ApiError {
    fn from(failure: TriageFailure) -> Self {
        match failure.error {
            TriageError::InvalidInput(msg) => ApiError::BadRequest(msg),
            error => ApiError::PredictionFailed {
                message: error.to_string(),
                analysis: failure.analysis,
            },
        }
    }
}

/// An [`ApiError`] bound to its request id
#[derive(Debug)]
pub struct ApiFailure {
    pub request_id: RequestId,
    pub error: ApiError,
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let unauthorized = matches!(self.error, ApiError::Unauthorized(_));
        let body = ErrorResponse::new(self.error.into_error_info(), self.request_id.0);

        let mut response = (status, Json(body)).into_response();
        if unauthorized {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Build the router with every endpoint and layer
pub fn create_router(state: AppState, config: &ServiceConfig) -> Router {
    let protected = Router::new()
        .route("/predict", post(predict))
        .route("/predict/", post(predict))
        .route("/analyze", post(analyze))
        .route("/analyze/", post(analyze))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_authorization,
        ));

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/rules", get(list_rules))
        .merge(protected);

    if config.metrics_enabled {
        router = router.route("/metrics", get(metrics_text));
    }

    router
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(axum::middleware::from_fn(error_envelope_middleware))
                .layer(TimeoutLayer::new(Duration::from_millis(config.request_timeout_ms)))
                .layer(DefaultBodyLimit::max(config.max_body_bytes)),
        )
        .with_state(state)
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: ROOT_MESSAGE.to_string(),
    })
}

/// POST /predict
pub async fn predict(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<VitalSigns>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiFailure> {
    let metrics = &state.metrics;
    let _timer = metrics.start_timer("predict");

    let Json(vitals) = payload.map_err(|rejection| {
        metrics.record_request("predict", "invalid");
        ApiError::from(rejection).for_request(&request_id)
    })?;

    match state.service.triage(&vitals) {
        Ok(result) => {
            metrics.record_findings(result.issues());
            metrics.record_prediction(result.condition.as_str());
            metrics.record_request("predict", "ok");
            tracing::debug!(
                request_id = %request_id,
                condition = %result.condition,
                findings = result.issues().len(),
                "Prediction completed"
            );
            Ok(Json(result))
        }
        Err(failure) => {
            metrics.record_findings(failure.analysis.issues());
            metrics.record_prediction_failure();
            metrics.record_request("predict", "error");
            Err(ApiError::from(failure).for_request(&request_id))
        }
    }
}

/// POST /analyze
pub async fn analyze(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<VitalSigns>, JsonRejection>,
) -> Result<Json<Analysis>, ApiFailure> {
    let metrics = &state.metrics;
    let _timer = metrics.start_timer("analyze");

    let Json(vitals) = payload.map_err(|rejection| {
        metrics.record_request("analyze", "invalid");
        ApiError::from(rejection).for_request(&request_id)
    })?;

    let analysis = state.service.analyze(&vitals);
    metrics.record_findings(analysis.issues());
    metrics.record_request("analyze", "ok");
    tracing::debug!(
        request_id = %request_id,
        findings = analysis.issues().len(),
        "Analysis completed"
    );

    Ok(Json(analysis))
}

/// GET /rules
pub async fn list_rules(State(state): State<AppState>) -> Json<RulesResponse> {
    let rules: Vec<RuleInfo> = state
        .service
        .analyzer()
        .rules()
        .rules()
        .iter()
        .map(RuleInfo::from)
        .collect();

    Json(RulesResponse {
        count: rules.len(),
        rules,
    })
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let predictor = state.service.predictor();
    let classes = predictor.classes();
    let rule_count = state.service.analyzer().rules().len();

    let components = ComponentHealth {
        predictor: !classes.is_empty(),
        analyzer: rule_count > 0,
    };

    Json(HealthResponse {
        status: components.status(),
        components,
        predictor: predictor.name().to_string(),
        classes,
        rule_count,
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics
pub async fn metrics_text(
    State(state): State<AppState>,
    request_id: RequestId,
) -> Result<Response, ApiFailure> {
    let text = state.metrics.encode_text().map_err(|e| {
        tracing::error!(request_id = %request_id, error = %e, "Failed to encode metrics");
        ApiError::InternalError(e.to_string()).for_request(&request_id)
    })?;

    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], text).into_response())
}

async fn not_found(request_id: RequestId) -> ApiFailure {
    ApiError::NotFound("No such endpoint".to_string()).for_request(&request_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_triage_core::{ParameterAnalyzer, VitalSigns};

    #[test]
    fn test_api_error_codes() {
        let error = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.error_code(), "BAD_REQUEST");

        let error = ApiError::Unauthorized("no token".to_string());
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);

        let error = ApiError::InternalError("boom".to_string());
        assert_eq!(error.error_code(), "INTERNAL_ERROR");

        let error = ApiError::RequestTimeout("slow".to_string());
        assert_eq!(error.status_code(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(error.error_code(), "REQUEST_TIMEOUT");

        let error = ApiError::MethodNotAllowed("GET".to_string());
        assert_eq!(error.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_prediction_failure_maps_to_500_with_issues() {
        let analysis = ParameterAnalyzer::new().assess(&VitalSigns::new(45, 32.0, 150, 95, 110, 140));
        let error = ApiError::from(TriageFailure {
            error: TriageError::prediction_failure("non-finite score"),
            analysis,
        });

        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.error_code(), "PREDICTION_FAILED");

        let info = error.into_error_info();
        let details = info.details.unwrap();
        assert_eq!(details["message"], "Some parameters are abnormal");
        assert_eq!(details["issues"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_unauthorized_response_has_challenge() {
        let response = ApiError::Unauthorized("no token".to_string())
            .for_request(&RequestId("req-1".to_string()))
            .into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
