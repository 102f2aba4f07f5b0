//! Server bootstrap
//!
//! Model artifacts are loaded once here; a load failure aborts startup.

use health_triage_core::{ArtifactPredictor, ConditionPredictor, ParameterAnalyzer, TriageService};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::handler::{create_router, AppState, Authorizer, StaticTokenAuthorizer};
use crate::telemetry::TriageMetrics;

/// Load the predictor and rules described by `config`
pub fn build_state(config: &ServiceConfig) -> Result<AppState> {
    let predictor = ArtifactPredictor::load(&config.model_dir)?;
    let analyzer = ParameterAnalyzer::with_rules(config.rule_table()?);
    let metrics = Arc::new(TriageMetrics::new()?);

    let authorizer = StaticTokenAuthorizer::new(config.auth_tokens.iter().cloned());
    if !authorizer.is_enabled() {
        tracing::warn!("No auth_tokens configured; /predict and /analyze accept any caller");
    }

    tracing::info!(
        model_dir = %config.model_dir.display(),
        classes = ?predictor.classes(),
        rules = analyzer.rules().len(),
        "Triage service initialized"
    );

    Ok(AppState::new(
        TriageService::new(Arc::new(predictor), analyzer),
        metrics,
        Arc::new(authorizer),
    ))
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: ServiceConfig) -> Result<()> {
    let state = build_state(&config)?;
    let router = create_router(state, &config);

    let listener = TcpListener::bind(config.bind_address).await.map_err(|e| {
        ServiceError::ServerError(format!("Failed to bind {}: {}", config.bind_address, e))
    })?;

    tracing::info!(
        address = %config.bind_address,
        version = env!("CARGO_PKG_VERSION"),
        "Health triage service listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::ServerError(e.to_string()))?;

    tracing::info!("Health triage service stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_state_without_model_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            model_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        let err = build_state(&config).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Triage(health_triage_core::TriageError::ModelUnavailable(_))
        ));
    }
}
