use registry::MlflowClient;
use service::{
    AppState, ModelSet, ServiceConfig, routes::run_server, schema::ModelMetadata,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env()?;

    let _telemetry = common::init_observability(
        "freshness-service",
        config.otel_endpoint.as_deref(),
        config.environment,
    )?;

    tracing::info!(config = ?config, "Loaded configuration");

    let registry = MlflowClient::new(&config.tracking_uri)?;

    tracing::info!(
        tracking_uri = %registry.base_url(),
        stage = %config.model_stage,
        "Loading models"
    );
    let models = ModelSet::load(&registry, config.model_stage).await;

    let unavailable = models.unavailable();
    if !unavailable.is_empty() {
        if config.require_models {
            anyhow::bail!("Models unavailable at startup: {}", unavailable.join(", "));
        }
        tracing::warn!(
            models = ?unavailable,
            "Starting in degraded mode; /predict will return 503 until restart"
        );
    }

    let state = AppState::new(models, ModelMetadata::published());
    run_server(&config.bind_addr, state).await
}
