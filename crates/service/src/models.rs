use crate::pipeline::PipelineError;
use registry::{ModelHandle, ModelRegistry, ModelStage};
use std::sync::Arc;

pub const DETECTOR_MODEL: &str = "fruit-detector";
pub const CLASSIFIER_MODEL: &str = "freshness-classifier";
pub const REGRESSOR_MODEL: &str = "shelf-life-regressor";

/// Outcome of loading one named model at startup.
#[derive(Debug, Clone)]
pub enum ModelSlot {
    Loaded(Arc<ModelHandle>),
    Unavailable { name: String, reason: String },
}

impl ModelSlot {
    pub fn unavailable(name: &str, reason: impl Into<String>) -> Self {
        ModelSlot::Unavailable {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelSlot::Loaded(_))
    }

    /// The loaded handle, or `ModelUnavailable` naming the missing model.
    pub fn require(&self) -> Result<&ModelHandle, PipelineError> {
        match self {
            ModelSlot::Loaded(handle) => Ok(handle),
            ModelSlot::Unavailable { name, reason } => Err(PipelineError::ModelUnavailable {
                model: name.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// The three models behind `/predict`. Read-only after startup.
#[derive(Debug, Clone)]
pub struct ModelSet {
    pub detector: ModelSlot,
    pub classifier: ModelSlot,
    pub regressor: ModelSlot,
}

impl ModelSet {
    /// Load all three models from `registry` concurrently.
    ///
    /// Failures never abort: each is logged and kept as an `Unavailable` slot.
    pub async fn load<R: ModelRegistry + Sync>(registry: &R, stage: ModelStage) -> Self {
        let (detector, classifier, regressor) = tokio::join!(
            load_slot(registry, DETECTOR_MODEL, stage),
            load_slot(registry, CLASSIFIER_MODEL, stage),
            load_slot(registry, REGRESSOR_MODEL, stage),
        );

        Self {
            detector,
            classifier,
            regressor,
        }
    }

    pub fn slots(&self) -> [&ModelSlot; 3] {
        [&self.detector, &self.classifier, &self.regressor]
    }

    /// Names of the models that failed to load.
    pub fn unavailable(&self) -> Vec<&str> {
        self.slots()
            .into_iter()
            .filter_map(|slot| match slot {
                ModelSlot::Unavailable { name, .. } => Some(name.as_str()),
                ModelSlot::Loaded(_) => None,
            })
            .collect()
    }
}

async fn load_slot<R: ModelRegistry>(registry: &R, name: &str, stage: ModelStage) -> ModelSlot {
    match registry.load_model(name, stage).await {
        Ok(handle) => {
            tracing::info!(
                model = %handle.uri(),
                version = %handle.version,
                stage = %handle.stage,
                source = %handle.source,
                "Model loaded"
            );
            ModelSlot::Loaded(Arc::new(handle))
        }
        Err(e) => {
            tracing::error!(
                model = name,
                stage = %stage,
                error = %e,
                "Failed to load model, serving without it"
            );
            ModelSlot::unavailable(name, e.to_string())
        }
    }
}
