use registry::MlflowClient;
use training::{TrainingConfig, train_model};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = TrainingConfig::from_env();

    let _telemetry = common::init_observability(
        "freshness-train",
        config.otel_endpoint.as_deref(),
        config.environment,
    )?;

    tracing::info!(config = ?config, "Loaded configuration");

    let tracker = MlflowClient::new(&config.tracking_uri)?;
    let summary = train_model(&tracker, &config).await?;

    tracing::info!(
        run_id = %summary.run_id,
        experiment_id = %summary.experiment_id,
        total_params = summary.total_params,
        "Run completed. Model logged to MLflow."
    );

    Ok(())
}
