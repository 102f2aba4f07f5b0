//! CLI module for the health triage service
//!
//! Runs the HTTP server, or analyzes and predicts single vitals records from
//! files without starting it.

pub mod commands;
pub mod output;

pub use commands::{TriageCli, TriageCommands};
pub use output::{OutputFormat, TriageOutput};

use crate::error::ServiceError;
use health_triage_core::TriageError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful execution, all parameters normal
    Success = 0,
    /// At least one parameter is out of range
    AbnormalParameters = 1,
    /// Invalid input or arguments
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Model artifacts missing or malformed
    ModelUnavailable = 5,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Exit code for a finished analysis
    pub fn from_analysis(is_normal: bool) -> Self {
        if is_normal {
            ExitCode::Success
        } else {
            ExitCode::AbnormalParameters
        }
    }

    /// Exit code for a failed command
    pub fn from_error(error: &ServiceError) -> Self {
        match error {
            ServiceError::FileError(_) => ExitCode::FileError,
            ServiceError::Triage(TriageError::ModelUnavailable(_)) => ExitCode::ModelUnavailable,
            e if e.is_user_error() => ExitCode::InvalidInput,
            _ => ExitCode::InternalError,
        }
    }
}

/// Run the CLI with the given arguments and return the exit code
pub async fn run(cli: TriageCli) -> Result<ExitCode, ServiceError> {
    let verbose = cli.verbose;
    let log_format = cli.log_format;

    match cli.command {
        TriageCommands::Serve(args) => commands::execute_serve(args, log_format, verbose).await,
        TriageCommands::Analyze {
            input,
            config,
            format,
        } => {
            commands::init_cli_tracing(log_format, verbose);
            commands::execute_analyze(input, config, format)
        }
        TriageCommands::Predict {
            input,
            model_dir,
            config,
            format,
        } => {
            commands::init_cli_tracing(log_format, verbose);
            commands::execute_predict(input, model_dir, config, format)
        }
        TriageCommands::Rules { config, format } => {
            commands::init_cli_tracing(log_format, verbose);
            commands::execute_rules(config, format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::AbnormalParameters), 1);
        assert_eq!(i32::from(ExitCode::ModelUnavailable), 5);
        assert_eq!(i32::from(ExitCode::InternalError), 10);
    }

    #[test]
    fn test_exit_code_from_analysis() {
        assert_eq!(ExitCode::from_analysis(true), ExitCode::Success);
        assert_eq!(ExitCode::from_analysis(false), ExitCode::AbnormalParameters);
    }

    #[test]
    fn test_exit_code_from_error() {
        assert_eq!(
            ExitCode::from_error(&ServiceError::file_error("gone")),
            ExitCode::FileError
        );
        assert_eq!(
            ExitCode::from_error(&TriageError::model_unavailable("no scaler").into()),
            ExitCode::ModelUnavailable
        );
        assert_eq!(
            ExitCode::from_error(&ServiceError::config_error("bad toml")),
            ExitCode::InvalidInput
        );
        assert_eq!(
            ExitCode::from_error(&TriageError::prediction_failure("nan").into()),
            ExitCode::InternalError
        );
        assert_eq!(
            ExitCode::from_error(&ServiceError::ServerError("bind".to_string())),
            ExitCode::InternalError
        );
    }
}
