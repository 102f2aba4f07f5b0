//! Prometheus metrics for the triage service
//!
//! - `health_triage_requests_total` (counter) - requests by endpoint and result
//! - `health_triage_request_duration_seconds` (histogram) - handler latency
//! - `health_triage_findings_total` (counter) - findings by parameter and status
//! - `health_triage_predictions_total` (counter) - predicted conditions
//! - `health_triage_prediction_failures_total` (counter)
//! - `health_triage_auth_rejections_total` (counter)
//!
//! # Example
//!
//! ```rust
//! use health_triage_api::telemetry::TriageMetrics;
//!
//! let metrics = TriageMetrics::new().unwrap();
//! metrics.record_request("analyze", "ok");
//! assert!(metrics.encode_text().unwrap().contains("health_triage_requests_total"));
//! ```

use health_triage_core::Finding;
use prometheus::{
    Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

use super::{Result, TelemetryError};

const NAMESPACE: &str = "health_triage";

/// Metrics owned by one registry
pub struct TriageMetrics {
    registry: Registry,

    /// Requests by endpoint and result
    requests_total: CounterVec,

    /// Handler duration by endpoint
    duration_seconds: HistogramVec,

    /// Findings by parameter label and status
    findings_total: CounterVec,

    /// Predicted condition labels
    predictions_total: CounterVec,

    prediction_failures_total: Counter,

    auth_rejections_total: Counter,
}

impl TriageMetrics {
    /// Create metrics in a fresh registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Create metrics and register them with `registry`
    pub fn with_registry(registry: Registry) -> Result<Self> {
        let requests_total = CounterVec::new(
            Opts::new("requests_total", "Total number of triage API requests")
                .namespace(NAMESPACE),
            &["endpoint", "result"],
        )?;

        let duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "request_duration_seconds",
                "Triage request handling duration in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["endpoint"],
        )?;

        let findings_total = CounterVec::new(
            Opts::new("findings_total", "Total number of out-of-range parameter findings")
                .namespace(NAMESPACE),
            &["parameter", "status"],
        )?;

        let predictions_total = CounterVec::new(
            Opts::new("predictions_total", "Total number of predictions by condition")
                .namespace(NAMESPACE),
            &["condition"],
        )?;

        let prediction_failures_total = Counter::with_opts(
            Opts::new("prediction_failures_total", "Total number of failed predictions")
                .namespace(NAMESPACE),
        )?;

        let auth_rejections_total = Counter::with_opts(
            Opts::new("auth_rejections_total", "Total number of unauthorized requests")
                .namespace(NAMESPACE),
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;
        registry.register(Box::new(findings_total.clone()))?;
        registry.register(Box::new(predictions_total.clone()))?;
        registry.register(Box::new(prediction_failures_total.clone()))?;
        registry.register(Box::new(auth_rejections_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            duration_seconds,
            findings_total,
            predictions_total,
            prediction_failures_total,
            auth_rejections_total,
        })
    }

    /// Record a finished request
    pub fn record_request(&self, endpoint: &str, result: &str) {
        self.requests_total
            .with_label_values(&[endpoint, result])
            .inc();
    }

    /// Observe handler duration
    pub fn observe_duration(&self, endpoint: &str, duration_secs: f64) {
        self.duration_seconds
            .with_label_values(&[endpoint])
            .observe(duration_secs);
    }

    /// Record every finding of one analysis
    pub fn record_findings(&self, findings: &[Finding]) {
        for finding in findings {
            self.findings_total
                .with_label_values(&[finding.parameter.label(), &finding.status.to_string()])
                .inc();
        }
    }

    pub fn record_prediction(&self, condition: &str) {
        self.predictions_total.with_label_values(&[condition]).inc();
    }

    pub fn record_prediction_failure(&self) {
        self.prediction_failures_total.inc();
    }

    pub fn record_auth_rejection(&self) {
        self.auth_rejections_total.inc();
    }

    /// Start a request timer (records duration on drop)
    pub fn start_timer<'a>(&'a self, endpoint: &'a str) -> RequestTimer<'a> {
        RequestTimer {
            start: Instant::now(),
            endpoint,
            metrics: self,
        }
    }

    /// Encode metrics as text for scraping
    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| TelemetryError::EncodingFailed(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::EncodingFailed(e.to_string()))
    }
}

impl std::fmt::Debug for TriageMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriageMetrics").finish_non_exhaustive()
    }
}

/// RAII guard for timing requests
pub struct RequestTimer<'a> {
    start: Instant,
    endpoint: &'a str,
    metrics: &'a TriageMetrics,
}

impl<'a> Drop for RequestTimer<'a> {
    fn drop(&mut self) {
        self.metrics
            .observe_duration(self.endpoint, self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_triage_core::{Parameter, Status};

    #[test]
    fn test_record_request() {
        let metrics = TriageMetrics::new().unwrap();

        metrics.record_request("predict", "ok");
        metrics.record_request("predict", "ok");
        metrics.record_request("analyze", "invalid");

        assert_eq!(
            metrics.requests_total.with_label_values(&["predict", "ok"]).get(),
            2.0
        );
        assert_eq!(
            metrics.requests_total.with_label_values(&["analyze", "invalid"]).get(),
            1.0
        );
    }

    #[test]
    fn test_record_findings() {
        let metrics = TriageMetrics::new().unwrap();
        let findings = vec![
            Finding::new(Parameter::Bmi, 32.0, Status::Obese, "x"),
            Finding::new(Parameter::HeartRate, 110.0, Status::High, "y"),
        ];

        metrics.record_findings(&findings);

        assert_eq!(
            metrics.findings_total.with_label_values(&["BMI", "Obese"]).get(),
            1.0
        );
        assert_eq!(
            metrics.findings_total.with_label_values(&["Heart Rate", "High"]).get(),
            1.0
        );
    }

    #[test]
    fn test_timer_observes_on_drop() {
        let metrics = TriageMetrics::new().unwrap();
        {
            let _timer = metrics.start_timer("predict");
        }
        assert_eq!(
            metrics.duration_seconds.with_label_values(&["predict"]).get_sample_count(),
            1
        );
    }

    #[test]
    fn test_encode_text() {
        let metrics = TriageMetrics::new().unwrap();
        metrics.record_prediction("Healthy");
        metrics.record_prediction_failure();
        metrics.record_auth_rejection();

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("health_triage_predictions_total{condition=\"Healthy\"} 1"));
        assert!(text.contains("health_triage_prediction_failures_total 1"));
        assert!(text.contains("health_triage_auth_rejections_total 1"));
    }

    #[test]
    fn test_separate_instances_do_not_collide() {
        let first = TriageMetrics::new().unwrap();
        let second = TriageMetrics::new().unwrap();
        first.record_auth_rejection();
        assert_eq!(second.auth_rejections_total.get(), 0.0);
    }
}
