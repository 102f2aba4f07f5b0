//! Health Triage API
//!
//! HTTP service and CLI around [`health_triage_core`].
//!
//! ## Architecture
//!
//! 1. **Handler** (`handler/`): axum router, bearer authorization, request
//!    logging and the JSON error envelope.
//! 2. **Telemetry** (`telemetry/`): Prometheus metrics and tracing setup.
//! 3. **Config** (`config`): service settings from TOML, YAML or JSON.
//! 4. **Server** (`server`): loads the model once and serves until Ctrl-C.
//! 5. **CLI** (`cli/`): `serve`, `analyze`, `predict` and `rules`.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Serve with a model directory and one accepted token
//! health-triage serve --model-dir models --auth-token s3cret
//!
//! # Analyze a vitals file without a model
//! health-triage analyze --input vitals.json --format json
//!
//! # Predict from a vitals file
//! health-triage predict --input vitals.yaml --model-dir models
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod server;
pub mod telemetry;

pub use cli::{ExitCode, OutputFormat, TriageCli, TriageCommands};
pub use config::{LogFormat, ServiceConfig};
pub use error::{Result, ServiceError};
pub use handler::{create_router, ApiError, AppState, Authorizer, StaticTokenAuthorizer};
pub use telemetry::TriageMetrics;

/// Run the CLI and return the process exit code
///
/// # Example
///
/// ```rust,no_run
/// use clap::Parser;
/// use health_triage_api::{run_cli, TriageCli};
///
/// #[tokio::main]
/// async fn main() {
///     let exit_code = run_cli(TriageCli::parse()).await;
///     std::process::exit(exit_code.into());
/// }
/// ```
pub async fn run_cli(cli: TriageCli) -> ExitCode {
    match cli::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::from_error(&e)
        }
    }
}
