//! Middleware for request processing
//!
//! - Bearer authorization in front of the triage endpoints
//! - Request logging with a per-request id
//! - JSON envelopes for the bodiless 405 and 408 responses that the router
//!   and the timeout layer produce
//!
//! Authorization is a seam: handlers only learn whether the caller is
//! authorized, never how. [`StaticTokenAuthorizer`] compares the bearer
//! credential against a configured token list.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use std::convert::Infallible;
use std::time::Instant;

use super::routes::{ApiError, AppState};

/// Header carrying the request id in both directions
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Decides whether a request may reach a protected endpoint
pub trait Authorizer: Send + Sync {
    /// Whether the request carries acceptable credentials
    fn is_authorized(&self, headers: &HeaderMap) -> bool;

    /// False when every request is let through
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Accepts `Authorization: Bearer <token>` for any configured token.
///
/// With no tokens configured, authorization is disabled.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthorizer {
    tokens: HashSet<String>,
}

impl StaticTokenAuthorizer {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Authorizer that lets every request through
    pub fn disabled() -> Self {
        Self::default()
    }
}

impl Authorizer for StaticTokenAuthorizer {
    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        if self.tokens.is_empty() {
            return true;
        }
        bearer_token(headers).is_some_and(|token| self.tokens.contains(token))
    }

    fn is_enabled(&self) -> bool {
        !self.tokens.is_empty()
    }
}

/// Extract the credential of an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Rejects unauthorized requests with 401 before the handler runs
pub async fn require_authorization(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.authorizer.is_authorized(request.headers()) {
        return next.run(request).await;
    }

    state.metrics.record_auth_rejection();
    let request_id = RequestId::from_extensions(&request);
    tracing::warn!(
        request_id = %request_id,
        uri = %request.uri(),
        "Rejected unauthorized request"
    );

    ApiError::Unauthorized("Missing or invalid bearer token".to_string())
        .for_request(&request_id)
        .into_response()
}

/// Identifier of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The id assigned by [`request_logging_middleware`], or a fresh one
    pub fn from_extensions(request: &Request) -> Self {
        request
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(RequestId::generate))
    }
}

/// Request logging middleware
///
/// Reuses an incoming `x-request-id` or generates one, makes it available
/// to handlers as [`RequestId`] and echoes it on the response.
pub async fn request_logging_middleware(mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| RequestId(v.to_string()))
        .unwrap_or_else(RequestId::generate);

    request.extensions_mut().insert(request_id.clone());
    let start = Instant::now();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Rewrites the router's 405 and the timeout layer's 408 into the error envelope
///
/// Must run inside [`request_logging_middleware`] so the request id is known.
pub async fn error_envelope_middleware(request: Request, next: Next) -> Response {
    let request_id = RequestId::from_extensions(&request);
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    let error = match response.status() {
        StatusCode::METHOD_NOT_ALLOWED => {
            ApiError::MethodNotAllowed(format!("Method {} not allowed on {}", method, uri.path()))
        }
        StatusCode::REQUEST_TIMEOUT => {
            tracing::warn!(request_id = %request_id, uri = %uri, "Request timed out");
            ApiError::RequestTimeout("Request did not complete in time".to_string())
        }
        _ => return response,
    };

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut rewritten = error.for_request(&request_id).into_response();
    if let Some(allow) = allow {
        rewritten.headers_mut().insert(header::ALLOW, allow);
    }
    rewritten
}
