use std::env;

pub use common::Environment;

const DEFAULT_TRACKING_URI: &str = "http://localhost:5000";
const DEFAULT_EXPERIMENT: &str = "Fruit_Freshness_Experiment";

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub environment: Environment,
    pub tracking_uri: String,
    pub experiment_name: String,
    pub run_name: Option<String>,
    pub otel_endpoint: Option<String>,
}

impl TrainingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            environment: Environment::parse(lookup("ENVIRONMENT").as_deref()),
            tracking_uri: lookup("MLFLOW_TRACKING_URI")
                .unwrap_or_else(|| DEFAULT_TRACKING_URI.to_string()),
            experiment_name: lookup("MLFLOW_EXPERIMENT_NAME")
                .unwrap_or_else(|| DEFAULT_EXPERIMENT.to_string()),
            run_name: lookup("MLFLOW_RUN_NAME").filter(|s| !s.is_empty()),
            otel_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|s| !s.is_empty()),
        }
    }
}
