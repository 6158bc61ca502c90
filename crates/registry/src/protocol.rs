//! Request and response bodies of the MLflow REST API (v2.0).

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetLatestVersionsRequest<'a> {
    pub name: &'a str,
    pub stages: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetLatestVersionsResponse {
    #[serde(default)]
    pub model_versions: Vec<ModelVersion>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelVersion {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetDownloadUriResponse {
    pub artifact_uri: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetExperimentResponse {
    pub experiment: Experiment,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Experiment {
    pub experiment_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateExperimentRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateExperimentResponse {
    pub experiment_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RunTag<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRunRequest<'a> {
    pub experiment_id: &'a str,
    pub start_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_name: Option<&'a str>,
    pub tags: Vec<RunTag<'a>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateRunResponse {
    pub run: Run,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Run {
    pub info: RunInfoBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunInfoBody {
    pub run_id: String,
    pub experiment_id: String,
    #[serde(default)]
    pub artifact_uri: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LogParamRequest<'a> {
    pub run_id: &'a str,
    pub key: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LogMetricRequest<'a> {
    pub run_id: &'a str,
    pub key: &'a str,
    pub value: f64,
    pub timestamp: i64,
    pub step: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SetTagRequest<'a> {
    pub run_id: &'a str,
    pub key: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateRunRequest<'a> {
    pub run_id: &'a str,
    pub status: &'a str,
    pub end_time: i64,
}
