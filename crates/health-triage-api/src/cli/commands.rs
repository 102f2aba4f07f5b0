//! CLI command definitions for the health triage service

use clap::{Args, Parser, Subcommand};
use health_triage_core::{
    ArtifactPredictor, ConditionPredictor, ParameterAnalyzer, TriageService, VitalSigns,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::output::{render_rules, OutputFormat, TriageOutput};
use super::ExitCode;
use crate::config::{LogFormat, ServiceConfig};
use crate::error::{Result, ServiceError};
use crate::telemetry::{directive_for_verbosity, init_tracing};

/// Health triage service
///
/// Predicts a condition label from six vital signs and reports every
/// out-of-range parameter with a suggestion.
#[derive(Parser, Debug)]
#[command(name = "health-triage")]
#[command(about = "Health triage service - condition prediction and vital-sign analysis", long_about = None)]
#[command(version)]
pub struct TriageCli {
    /// Output verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, global = true, env = "HEALTH_TRIAGE_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: TriageCommands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum TriageCommands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Analyze a vitals file against the threshold table
    Analyze {
        /// Vitals record (.json, .yaml, .yml or .toml)
        #[arg(short, long)]
        input: PathBuf,

        /// Service config whose extra_rules are applied
        #[arg(short, long, env = "HEALTH_TRIAGE_CONFIG")]
        config: Option<PathBuf>,

        /// Output format for results
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Predict the condition and analyze a vitals file
    Predict {
        /// Vitals record (.json, .yaml, .yml or .toml)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory holding the model artifacts
        #[arg(short, long, env = "HEALTH_TRIAGE_MODEL_DIR")]
        model_dir: Option<PathBuf>,

        /// Service config whose model_dir and extra_rules are applied
        #[arg(short, long, env = "HEALTH_TRIAGE_CONFIG")]
        config: Option<PathBuf>,

        /// Output format for results
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// List the active threshold rules
    Rules {
        /// Service config whose extra_rules are applied
        #[arg(short, long, env = "HEALTH_TRIAGE_CONFIG")]
        config: Option<PathBuf>,

        /// Output format for results
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Arguments of `serve`; each overrides the config file
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Path to the service config file
    #[arg(short, long, env = "HEALTH_TRIAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind, e.g. 0.0.0.0:8000
    #[arg(long, env = "HEALTH_TRIAGE_BIND")]
    pub bind: Option<SocketAddr>,

    /// Directory holding the model artifacts
    #[arg(long, env = "HEALTH_TRIAGE_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Accepted bearer token (repeatable, or comma-separated in the env var)
    #[arg(long = "auth-token", env = "HEALTH_TRIAGE_AUTH_TOKENS", value_delimiter = ',')]
    pub auth_tokens: Vec<String>,

    /// Disable GET /metrics
    #[arg(long)]
    pub no_metrics: bool,
}

impl ServeArgs {
    /// Load the config file (if any) and apply flag overrides
    pub fn resolve(&self) -> Result<ServiceConfig> {
        let mut config = load_config(self.config.as_deref())?;

        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(model_dir) = &self.model_dir {
            config.model_dir = model_dir.clone();
        }
        if !self.auth_tokens.is_empty() {
            config.auth_tokens = self.auth_tokens.clone();
        }
        if self.no_metrics {
            config.metrics_enabled = false;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Install tracing for the one-shot commands (warnings only by default)
pub fn init_cli_tracing(log_format: Option<LogFormat>, verbose: u8) {
    init_tracing(
        log_format.unwrap_or_default(),
        &directive_for_verbosity("warn", verbose),
    );
}

/// Execute the serve command
pub async fn execute_serve(
    args: ServeArgs,
    log_format: Option<LogFormat>,
    verbose: u8,
) -> Result<ExitCode> {
    let config = args.resolve()?;
    init_tracing(
        log_format.unwrap_or(config.log_format),
        &directive_for_verbosity("info", verbose),
    );

    crate::server::serve(config).await?;
    Ok(ExitCode::Success)
}

/// Execute the analyze command
pub fn execute_analyze(
    input: PathBuf,
    config: Option<PathBuf>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let config = load_config(config.as_deref())?;
    let vitals = read_vitals(&input)?;

    let analyzer = ParameterAnalyzer::with_rules(config.rule_table()?);
    let analysis = analyzer.assess(&vitals);
    let exit_code = ExitCode::from_analysis(analysis.is_normal());

    TriageOutput::from_analysis(None, &analysis).render(format)?;
    Ok(exit_code)
}

/// Execute the predict command
pub fn execute_predict(
    input: PathBuf,
    model_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let config = load_config(config.as_deref())?;
    let vitals = read_vitals(&input)?;
    let model_dir = model_dir.unwrap_or_else(|| config.model_dir.clone());

    let predictor = ArtifactPredictor::load(&model_dir)?;
    tracing::debug!(predictor = predictor.name(), classes = ?predictor.classes(), "Model loaded");

    let service = TriageService::new(
        Arc::new(predictor),
        ParameterAnalyzer::with_rules(config.rule_table()?),
    );
    let result = service.triage(&vitals).map_err(|failure| failure.error)?;
    let exit_code = ExitCode::from_analysis(result.issues().is_empty());

    TriageOutput::from_analysis(Some(result.condition.to_string()), &result.analysis).render(format)?;
    Ok(exit_code)
}

/// Execute the rules command
pub fn execute_rules(config: Option<PathBuf>, format: OutputFormat) -> Result<ExitCode> {
    let config = load_config(config.as_deref())?;
    render_rules(&config.rule_table()?, format)?;
    Ok(ExitCode::Success)
}

fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    match path {
        Some(path) => ServiceConfig::from_file(path),
        None => Ok(ServiceConfig::default()),
    }
}

/// Read a vitals record, choosing the parser by file extension
pub fn read_vitals(path: &Path) -> Result<VitalSigns> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ServiceError::file_error(format!(
            "Failed to read vitals file '{}': {}",
            path.display(),
            e
        ))
    })?;

    parse_vitals(path, &content)
}

/// Parse vitals content based on file extension
fn parse_vitals(path: &Path, content: &str) -> Result<VitalSigns> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => serde_json::from_str(content)
            .map_err(|e| ServiceError::invalid_input(format!("Invalid JSON: {}", e))),
        "yaml" | "yml" => serde_yaml::from_str(content)
            .map_err(|e| ServiceError::invalid_input(format!("Invalid YAML: {}", e))),
        "toml" => toml::from_str(content)
            .map_err(|e| ServiceError::invalid_input(format!("Invalid TOML: {}", e))),
        _ => Err(ServiceError::invalid_input(format!(
            "Unsupported file format: '{}'. Supported formats: json, yaml, yml, toml",
            extension
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NORMAL_JSON: &str = r#"{"age":30,"bmi":22.0,"systolicbp":120,"diastolicbp":80,"heartrate":70,"glucose":90}"#;

    #[test]
    fn test_parse_vitals_formats() {
        let expected = VitalSigns::new(30, 22.0, 120, 80, 70, 90);

        let json = parse_vitals(Path::new("v.json"), NORMAL_JSON).unwrap();
        assert_eq!(json, expected);

        let yaml = parse_vitals(
            Path::new("v.yaml"),
            "age: 30\nbmi: 22.0\nsystolicbp: 120\ndiastolicbp: 80\nheartrate: 70\nglucose: 90\n",
        )
        .unwrap();
        assert_eq!(yaml, expected);

        let toml = parse_vitals(
            Path::new("v.toml"),
            "age = 30\nbmi = 22.0\nsystolicbp = 120\ndiastolicbp = 80\nheartrate = 70\nglucose = 90\n",
        )
        .unwrap();
        assert_eq!(toml, expected);
    }

    #[test]
    fn test_parse_vitals_rejects_missing_field() {
        let err = parse_vitals(Path::new("v.json"), r#"{"age":30}"#).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn test_parse_vitals_unsupported_extension() {
        let err = parse_vitals(Path::new("v.csv"), NORMAL_JSON).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[test]
    fn test_read_vitals_missing_file() {
        let err = read_vitals(Path::new("/nonexistent/vitals.json")).unwrap_err();
        assert!(matches!(err, ServiceError::FileError(_)));
    }

    #[test]
    fn test_execute_analyze_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let normal = dir.path().join("normal.json");
        std::fs::write(&normal, NORMAL_JSON).unwrap();
        let abnormal = dir.path().join("abnormal.yaml");
        std::fs::write(
            &abnormal,
            "age: 45\nbmi: 32.0\nsystolicbp: 150\ndiastolicbp: 95\nheartrate: 110\nglucose: 140\n",
        )
        .unwrap();

        assert_eq!(
            execute_analyze(normal, None, OutputFormat::Json).unwrap(),
            ExitCode::Success
        );
        assert_eq!(
            execute_analyze(abnormal, None, OutputFormat::Json).unwrap(),
            ExitCode::AbnormalParameters
        );
    }

    #[test]
    fn test_serve_args_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triage.toml");
        std::fs::write(&path, "model_dir = \"from-file\"\nauth_tokens = [\"file-token\"]\n").unwrap();

        let args = ServeArgs {
            config: Some(path),
            bind: Some("0.0.0.0:9100".parse().unwrap()),
            auth_tokens: vec!["flag-token".to_string()],
            no_metrics: true,
            ..Default::default()
        };
        let config = args.resolve().unwrap();

        assert_eq!(config.bind_address.port(), 9100);
        assert_eq!(config.model_dir, PathBuf::from("from-file"));
        assert_eq!(config.auth_tokens, vec!["flag-token".to_string()]);
        assert!(!config.metrics_enabled);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = TriageCli::try_parse_from([
            "health-triage",
            "-v",
            "predict",
            "--input",
            "vitals.json",
            "--model-dir",
            "models",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            TriageCommands::Predict {
                input,
                model_dir,
                format,
                ..
            } => {
                assert_eq!(input, PathBuf::from("vitals.json"));
                assert_eq!(model_dir, Some(PathBuf::from("models")));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
