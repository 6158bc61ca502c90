use registry::ModelStage;
use std::env;

pub use common::Environment;

const DEFAULT_TRACKING_URI: &str = "http://localhost:5000";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub environment: Environment,
    pub tracking_uri: String,
    pub bind_addr: String,
    pub model_stage: ModelStage,
    /// Refuse to start when any model fails to load.
    pub require_models: bool,
    pub otel_endpoint: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let environment = Environment::parse(lookup("ENVIRONMENT").as_deref());

        let tracking_uri =
            lookup("MLFLOW_TRACKING_URI").unwrap_or_else(|| DEFAULT_TRACKING_URI.to_string());

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let model_stage = match lookup("MODEL_STAGE") {
            Some(stage) => stage.parse().map_err(anyhow::Error::msg)?,
            None => ModelStage::Production,
        };

        let require_models = lookup("REQUIRE_MODELS")
            .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let otel_endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|s| !s.is_empty());

        Ok(Self {
            environment,
            tracking_uri,
            bind_addr,
            model_stage,
            require_models,
            otel_endpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<ServiceConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.tracking_uri, "http://localhost:5000");
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.model_stage, ModelStage::Production);
        assert_eq!(config.environment, Environment::Development);
        assert!(!config.require_models);
        assert!(config.otel_endpoint.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("MLFLOW_TRACKING_URI", "http://mlflow:5000"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("MODEL_STAGE", "staging"),
            ("REQUIRE_MODELS", "true"),
            ("ENVIRONMENT", "production"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://otel:4317"),
        ])
        .unwrap();
        assert_eq!(config.tracking_uri, "http://mlflow:5000");
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.model_stage, ModelStage::Staging);
        assert!(config.require_models);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.otel_endpoint.as_deref(), Some("http://otel:4317"));
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let err = config_from(&[("MODEL_STAGE", "live")]).unwrap_err();
        assert!(err.to_string().contains("not a model stage"));
    }

    #[test]
    fn default_config_still_publishes_production_metadata() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(crate::schema::ModelMetadata::published().env, "production");
    }

    #[test]
    fn empty_otel_endpoint_disables_export() {
        let config = config_from(&[("OTEL_EXPORTER_OTLP_ENDPOINT", "")]).unwrap();
        assert!(config.otel_endpoint.is_none());
    }
}
