use crate::clock::Clock;
use crate::models::ModelSet;
use crate::schema::ModelMetadata;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};
use std::sync::Arc;

/// Request metrics for `/predict`, exported through the global meter provider.
#[derive(Clone)]
pub struct PredictMetrics {
    pub duration: Histogram<f64>,
    pub requests: Counter<u64>,
    pub detections: Counter<u64>,
}

impl PredictMetrics {
    pub fn new(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.001, 0.002, 0.005, 0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0,
        ];
        let duration = meter
            .f64_histogram("predict_duration_seconds")
            .with_description("Time to serve a /predict request (read + decode + pipeline)")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build();
        let requests = meter
            .u64_counter("predict_requests_total")
            .with_description("Total /predict requests by outcome")
            .build();
        let detections = meter
            .u64_counter("predict_detections_total")
            .with_description("Total result records returned")
            .build();

        Self {
            duration,
            requests,
            detections,
        }
    }
}

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub models: Arc<ModelSet>,
    pub metadata: Arc<ModelMetadata>,
    pub clock: Arc<Clock>,
    pub metrics: PredictMetrics,
}

impl AppState {
    pub fn new(models: ModelSet, metadata: ModelMetadata) -> Self {
        Self {
            models: Arc::new(models),
            metadata: Arc::new(metadata),
            clock: Arc::new(Clock::new()),
            metrics: PredictMetrics::new("freshness-service"),
        }
    }
}
