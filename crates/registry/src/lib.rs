//! Client for an MLflow-compatible tracking server.
//!
//! Two halves share one HTTP client: the model registry, which resolves
//! `name/stage` references to concrete model versions, and the experiment
//! tracker, which records runs, parameters, metrics and artifacts.

pub mod client;
pub mod errors;
pub mod models;
mod protocol;
pub mod tracking;

pub use client::MlflowClient;
pub use errors::RegistryError;
pub use models::{ModelHandle, ModelRegistry, ModelStage};
pub use tracking::{ExperimentTracker, RunInfo, RunStatus};

pub type Result<T> = std::result::Result<T, RegistryError>;
