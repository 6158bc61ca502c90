use crate::client::MlflowClient;
use crate::errors::RegistryError;
use crate::protocol::{
    CreateExperimentRequest, CreateExperimentResponse, CreateRunRequest, CreateRunResponse,
    GetExperimentResponse, LogMetricRequest, LogParamRequest, RunTag, SetTagRequest,
    UpdateRunRequest,
};
use crate::Result;
use chrono::Utc;
use std::future::Future;

const RESOURCE_DOES_NOT_EXIST: &str = "RESOURCE_DOES_NOT_EXIST";
const PROXIED_ARTIFACT_SCHEME: &str = "mlflow-artifacts:/";

/// Terminal status of a tracked run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Finished,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Finished => "FINISHED",
            RunStatus::Failed => "FAILED",
        }
    }
}

/// Identity of an active run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    pub run_id: String,
    pub experiment_id: String,
    pub artifact_uri: String,
}

/// Run-scoped experiment logging.
pub trait ExperimentTracker {
    /// Look up an experiment by name, creating it when missing. Returns its id.
    fn get_or_create_experiment(&self, name: &str) -> impl Future<Output = Result<String>> + Send;

    fn start_run(
        &self,
        experiment_id: &str,
        run_name: Option<&str>,
    ) -> impl Future<Output = Result<RunInfo>> + Send;

    fn log_param(
        &self,
        run: &RunInfo,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    fn log_metric(
        &self,
        run: &RunInfo,
        key: &str,
        value: f64,
        step: i64,
    ) -> impl Future<Output = Result<()>> + Send;

    fn set_tag(
        &self,
        run: &RunInfo,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Upload `contents` to `path`, relative to the run's artifact root.
    fn log_artifact(
        &self,
        run: &RunInfo,
        path: &str,
        contents: Vec<u8>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn end_run(&self, run: &RunInfo, status: RunStatus) -> impl Future<Output = Result<()>> + Send;
}

impl ExperimentTracker for MlflowClient {
    async fn get_or_create_experiment(&self, name: &str) -> Result<String> {
        let url = self.api_url("experiments/get-by-name");
        let lookup = self
            .send_json::<GetExperimentResponse>(
                &url,
                self.http().get(&url).query(&[("experiment_name", name)]),
            )
            .await;

        match lookup {
            Ok(found) => Ok(found.experiment.experiment_id),
            Err(e) if e.error_code() == Some(RESOURCE_DOES_NOT_EXIST) => {
                tracing::info!(experiment = name, "Creating experiment");
                let url = self.api_url("experiments/create");
                let created: CreateExperimentResponse = self
                    .send_json(
                        &url,
                        self.http().post(&url).json(&CreateExperimentRequest { name }),
                    )
                    .await?;
                Ok(created.experiment_id)
            }
            Err(e) => Err(e),
        }
    }

    async fn start_run(&self, experiment_id: &str, run_name: Option<&str>) -> Result<RunInfo> {
        let url = self.api_url("runs/create");
        let mut tags = vec![RunTag {
            key: "mlflow.source.name",
            value: env!("CARGO_PKG_NAME"),
        }];
        if let Some(run_name) = run_name {
            tags.push(RunTag {
                key: "mlflow.runName",
                value: run_name,
            });
        }
        let request = CreateRunRequest {
            experiment_id,
            start_time: Utc::now().timestamp_millis(),
            run_name,
            tags,
        };
        let created: CreateRunResponse =
            self.send_json(&url, self.http().post(&url).json(&request)).await?;

        Ok(RunInfo {
            run_id: created.run.info.run_id,
            experiment_id: created.run.info.experiment_id,
            artifact_uri: created.run.info.artifact_uri,
        })
    }

    async fn log_param(&self, run: &RunInfo, key: &str, value: &str) -> Result<()> {
        let url = self.api_url("runs/log-parameter");
        let request = LogParamRequest {
            run_id: &run.run_id,
            key,
            value,
        };
        self.send(&url, self.http().post(&url).json(&request)).await?;
        Ok(())
    }

    async fn log_metric(&self, run: &RunInfo, key: &str, value: f64, step: i64) -> Result<()> {
        let url = self.api_url("runs/log-metric");
        let request = LogMetricRequest {
            run_id: &run.run_id,
            key,
            value,
            timestamp: Utc::now().timestamp_millis(),
            step,
        };
        self.send(&url, self.http().post(&url).json(&request)).await?;
        Ok(())
    }

    async fn set_tag(&self, run: &RunInfo, key: &str, value: &str) -> Result<()> {
        let url = self.api_url("runs/set-tag");
        let request = SetTagRequest {
            run_id: &run.run_id,
            key,
            value,
        };
        self.send(&url, self.http().post(&url).json(&request)).await?;
        Ok(())
    }

    async fn log_artifact(&self, run: &RunInfo, path: &str, contents: Vec<u8>) -> Result<()> {
        let root = proxied_artifact_root(&run.artifact_uri)?;
        let url = self.artifact_url(&format!("{}/{}", root, path.trim_start_matches('/')));
        self.send(&url, self.http().put(&url).body(contents)).await?;
        Ok(())
    }

    async fn end_run(&self, run: &RunInfo, status: RunStatus) -> Result<()> {
        let url = self.api_url("runs/update");
        let request = UpdateRunRequest {
            run_id: &run.run_id,
            status: status.as_str(),
            end_time: Utc::now().timestamp_millis(),
        };
        self.send(&url, self.http().post(&url).json(&request)).await?;
        Ok(())
    }
}

/// Artifact root relative to the server's artifact proxy. Only
/// `mlflow-artifacts:/` roots can be uploaded over HTTP.
fn proxied_artifact_root(artifact_uri: &str) -> Result<&str> {
    artifact_uri
        .strip_prefix(PROXIED_ARTIFACT_SCHEME)
        .map(|root| root.trim_matches('/'))
        .filter(|root| !root.is_empty())
        .ok_or_else(|| RegistryError::UnsupportedArtifactUri(artifact_uri.to_string()))
}
