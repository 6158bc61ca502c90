use crate::errors::ApiError;
use crate::pipeline;
use crate::schema::{HealthResponse, InferenceResult, ModelMetadata};
use crate::state::AppState;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    routing::{get, post},
};
use opentelemetry::KeyValue;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Upload size accepted by `/predict`.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

const FILE_FIELD: &str = "file";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/model/metadata", get(metadata))
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(bind_addr: &str, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: state.clock.unix_timestamp(),
    })
}

async fn metadata(State(state): State<AppState>) -> Json<ModelMetadata> {
    Json(state.metadata.as_ref().clone())
}

async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<InferenceResult>>, ApiError> {
    let start = Instant::now();

    let outcome = run_predict(&state, multipart, start).await;

    let label = match &outcome {
        Ok(results) => {
            state.metrics.detections.add(results.len() as u64, &[]);
            "ok"
        }
        Err(e) => e.kind(),
    };
    let attributes = [KeyValue::new("outcome", label)];
    state.metrics.requests.add(1, &attributes);
    state
        .metrics
        .duration
        .record(start.elapsed().as_secs_f64(), &attributes);

    outcome.map(Json)
}

async fn run_predict(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
    start: Instant,
) -> Result<Vec<InferenceResult>, ApiError> {
    let bytes = read_file_field(multipart?).await?;

    tracing::debug!(bytes = bytes.len(), "Received upload");

    let models = state.models.clone();
    let results = tokio::task::spawn_blocking(move || pipeline::predict(&models, &bytes, start))
        .await
        .map_err(|e| ApiError::Internal(format!("Prediction task failed: {}", e)))??;

    tracing::debug!(
        results = results.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Prediction complete"
    );

    Ok(results)
}

/// Bytes of the `file` form field. Other fields are skipped.
async fn read_file_field(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            return Ok(field.bytes().await?);
        }
    }
    Err(ApiError::MissingFile)
}
