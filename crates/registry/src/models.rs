use crate::client::MlflowClient;
use crate::errors::RegistryError;
use crate::protocol::{GetDownloadUriResponse, GetLatestVersionsRequest, GetLatestVersionsResponse};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

/// Deployment stage of a registered model version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelStage {
    None,
    Staging,
    Production,
    Archived,
}

impl ModelStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelStage::None => "None",
            ModelStage::Staging => "Staging",
            ModelStage::Production => "Production",
            ModelStage::Archived => "Archived",
        }
    }
}

impl fmt::Display for ModelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelStage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            "archived" => Ok(Self::Archived),
            other => Err(format!(
                "{} is not a model stage. Use one of `None`, `Staging`, `Production`, `Archived`.",
                other
            )),
        }
    }
}

/// A resolved model version. Opaque to callers beyond identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelHandle {
    pub name: String,
    pub stage: ModelStage,
    pub version: String,
    /// Artifact location the model can be downloaded from.
    pub source: String,
    pub run_id: Option<String>,
}

impl ModelHandle {
    /// Registry reference in `models:/name/stage` form.
    pub fn uri(&self) -> String {
        format!("models:/{}/{}", self.name, self.stage)
    }
}

/// Resolves `name/stage` references to model handles.
pub trait ModelRegistry {
    fn load_model(
        &self,
        name: &str,
        stage: ModelStage,
    ) -> impl Future<Output = Result<ModelHandle>> + Send;
}

impl ModelRegistry for MlflowClient {
    async fn load_model(&self, name: &str, stage: ModelStage) -> Result<ModelHandle> {
        let url = self.api_url("registered-models/get-latest-versions");
        let request = GetLatestVersionsRequest {
            name,
            stages: [stage.as_str()],
        };
        let latest: GetLatestVersionsResponse = self
            .send_json(&url, self.http().post(&url).json(&request))
            .await?;

        let version = latest
            .model_versions
            .into_iter()
            .next()
            .ok_or_else(|| RegistryError::NoVersionInStage {
                name: name.to_string(),
                stage,
            })?;

        let url = self.api_url("model-versions/get-download-uri");
        let download: GetDownloadUriResponse = self
            .send_json(
                &url,
                self.http().get(&url).query(&[
                    ("name", version.name.as_str()),
                    ("version", version.version.as_str()),
                ]),
            )
            .await?;

        tracing::debug!(
            model = %version.name,
            version = %version.version,
            registered_source = ?version.source,
            artifact_uri = %download.artifact_uri,
            "Resolved model version"
        );

        Ok(ModelHandle {
            name: version.name,
            stage,
            version: version.version,
            source: download.artifact_uri,
            run_id: version.run_id.filter(|id| !id.is_empty()),
        })
    }
}
