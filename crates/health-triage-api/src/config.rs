//! Service configuration
//!
//! Every field has a default, so an absent or partial file is valid. The
//! file format is chosen by extension: `.toml`, `.yaml`/`.yml` or `.json`.
//! CLI flags (and their `HEALTH_TRIAGE_*` environment variables) are applied
//! on top by the caller.

use clap::ValueEnum;
use health_triage_core::{default_rules, RuleTable, ThresholdRule};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Result, ServiceError};

/// Log output format
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Configuration for the triage service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Socket address the HTTP server binds to
    pub bind_address: SocketAddr,
    /// Directory holding scaler.json, classifier.json and label_encoder.json
    pub model_dir: PathBuf,
    /// Accepted bearer tokens; empty disables authorization
    pub auth_tokens: Vec<String>,
    /// Maximum request body size in bytes
    pub max_body_bytes: usize,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Whether GET /metrics is exposed
    pub metrics_enabled: bool,
    pub log_format: LogFormat,
    /// Rules appended after the default table
    pub extra_rules: Vec<ThresholdRule>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            model_dir: PathBuf::from("models"),
            auth_tokens: Vec::new(),
            max_body_bytes: 64 * 1024,
            request_timeout_ms: 10_000,
            metrics_enabled: true,
            log_format: LogFormat::Pretty,
            extra_rules: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::file_error(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::parse(path, &content)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "toml" => toml::from_str(content)
                .map_err(|e| ServiceError::config_error(format!("Invalid TOML: {}", e))),
            "yaml" | "yml" => serde_yaml::from_str(content)
                .map_err(|e| ServiceError::config_error(format!("Invalid YAML: {}", e))),
            "json" => serde_json::from_str(content)
                .map_err(|e| ServiceError::config_error(format!("Invalid JSON: {}", e))),
            _ => Err(ServiceError::config_error(format!(
                "Unsupported config format: '{}'. Supported formats: toml, yaml, yml, json",
                extension
            ))),
        }
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.max_body_bytes == 0 {
            return Err(ServiceError::config_error("max_body_bytes must be positive"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ServiceError::config_error("request_timeout_ms must be positive"));
        }
        if self.auth_tokens.iter().any(|t| t.trim().is_empty()) {
            return Err(ServiceError::config_error("auth_tokens must not contain blank tokens"));
        }
        self.rule_table().map(|_| ())
    }

    /// Default rules followed by `extra_rules`
    pub fn rule_table(&self) -> Result<RuleTable> {
        let mut table = default_rules();
        table
            .extend(self.extra_rules.iter().cloned())
            .map_err(|e| ServiceError::config_error(e.to_string()))?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_triage_core::{Comparison, Parameter, Status};

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_address.port(), 8000);
        assert_eq!(config.model_dir, PathBuf::from("models"));
        assert!(config.auth_tokens.is_empty());
        assert!(config.metrics_enabled);
        assert_eq!(config.rule_table().unwrap().len(), 10);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = ServiceConfig::parse(
            Path::new("triage.toml"),
            r#"
                bind_address = "0.0.0.0:9000"
                auth_tokens = ["secret"]

                [[extra_rules]]
                parameter = "age"
                comparison = "ge"
                threshold = 65
                status = "High"
                suggestion = "Schedule a yearly check-up."
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_address.port(), 9000);
        assert_eq!(config.auth_tokens, vec!["secret".to_string()]);
        assert_eq!(config.request_timeout_ms, 10_000);
        assert_eq!(
            config.extra_rules,
            vec![ThresholdRule::new(
                Parameter::Age,
                Comparison::Ge,
                65.0,
                Status::High,
                "Schedule a yearly check-up."
            )]
        );
        assert_eq!(config.rule_table().unwrap().len(), 11);
    }

    #[test]
    fn test_parse_yaml() {
        let config = ServiceConfig::parse(
            Path::new("triage.yaml"),
            "model_dir: /opt/models\nlog_format: json\nmetrics_enabled: false\n",
        )
        .unwrap();
        assert_eq!(config.model_dir, PathBuf::from("/opt/models"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.metrics_enabled);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ServiceConfig::parse(Path::new("triage.json"), r#"{"port": 80}"#).unwrap_err();
        assert!(matches!(err, ServiceError::ConfigError(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ServiceConfig::parse(Path::new("triage.ini"), "").unwrap_err();
        assert!(err.to_string().contains("Unsupported config format"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ServiceConfig {
            request_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_extra_rule() {
        let config = ServiceConfig {
            extra_rules: vec![ThresholdRule::new(
                Parameter::Glucose,
                Comparison::Gt,
                f64::NAN,
                Status::High,
                "x",
            )],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ServiceError::ConfigError(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triage.json");
        std::fs::write(&path, r#"{"max_body_bytes": 1024}"#).unwrap();

        let config = ServiceConfig::from_file(&path).unwrap();
        assert_eq!(config.max_body_bytes, 1024);

        let missing = ServiceConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, ServiceError::FileError(_)));
    }
}
