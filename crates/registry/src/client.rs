use crate::errors::RegistryError;
use crate::protocol::ApiErrorBody;
use crate::Result;
use reqwest::{Client, ClientBuilder, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default connection timeout for registry requests.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default request timeout for registry requests.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const API_PREFIX: &str = "api/2.0/mlflow";
const ARTIFACTS_PREFIX: &str = "api/2.0/mlflow-artifacts/artifacts";

/// HTTP client for an MLflow tracking server.
#[derive(Clone, Debug)]
pub struct MlflowClient {
    base_url: String,
    http: Client,
}

impl MlflowClient {
    /// Create a client for `tracking_uri` (e.g. `http://localhost:5000`).
    pub fn new(tracking_uri: &str) -> Result<Self> {
        Self::with_timeouts(tracking_uri, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeouts(
        tracking_uri: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let parsed = Url::parse(tracking_uri)
            .map_err(|e| RegistryError::InvalidUri(format!("{tracking_uri}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RegistryError::InvalidUri(format!(
                "{tracking_uri}: scheme must be http or https"
            )));
        }

        let http = build_http(
            Client::builder()
                .connect_timeout(connect_timeout)
                .timeout(request_timeout),
        )?;

        Ok(Self {
            base_url: tracking_uri.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, endpoint)
    }

    pub(crate) fn artifact_url(&self, relative: &str) -> String {
        format!("{}/{}/{}", self.base_url, ARTIFACTS_PREFIX, relative)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Send `request` and decode a JSON response body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let body = self.send(url, request).await?;
        serde_json::from_slice(&body).map_err(|source| RegistryError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Send `request`, failing on any non-2xx status. Returns the raw body.
    pub(crate) async fn send(&self, url: &str, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = request.send().await.map_err(|source| RegistryError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| RegistryError::Http {
                url: url.to_string(),
                source,
            })?;

        if !status.is_success() {
            tracing::debug!(url, status = status.as_u16(), "Registry request failed");
            return Err(api_error(status.as_u16(), &body));
        }

        Ok(body.to_vec())
    }
}

/// Build an `Api` error from a failed response, keeping the raw body as the
/// message when it is not a structured MLflow error.
fn api_error(status: u16, body: &[u8]) -> RegistryError {
    match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error_code.is_empty() => RegistryError::Api {
            status,
            error_code: parsed.error_code,
            message: parsed.message,
        },
        _ => RegistryError::Api {
            status,
            error_code: "UNKNOWN".to_string(),
            message: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

fn build_http(builder: ClientBuilder) -> Result<Client> {
    builder.build().map_err(RegistryError::Client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_non_http_uri() {
        let err = MlflowClient::new("file:///tmp/mlruns").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidUri(_)));

        let err = MlflowClient::new("not a uri").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidUri(_)));
    }

    #[test]
    fn builder_failure_is_reported() {
        let err = build_http(Client::builder().user_agent("bad\nagent")).unwrap_err();
        assert!(matches!(err, RegistryError::Client(_)));
        assert!(err.to_string().starts_with("Failed to build HTTP client"));
    }

    #[test]
    fn urls_strip_trailing_slash() {
        let client = MlflowClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(
            client.api_url("runs/create"),
            "http://localhost:5000/api/2.0/mlflow/runs/create"
        );
        assert_eq!(
            client.artifact_url("1/abc/artifacts/model/MLmodel"),
            "http://localhost:5000/api/2.0/mlflow-artifacts/artifacts/1/abc/artifacts/model/MLmodel"
        );
    }

    #[test]
    fn api_error_parses_mlflow_body() {
        let body = br#"{"error_code":"RESOURCE_DOES_NOT_EXIST","message":"not found"}"#;
        match api_error(404, body) {
            RegistryError::Api {
                status,
                error_code,
                message,
            } => {
                assert_eq!(status, 404);
                assert_eq!(error_code, "RESOURCE_DOES_NOT_EXIST");
                assert_eq!(message, "not found");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn api_error_keeps_unstructured_body() {
        match api_error(502, b"Bad Gateway") {
            RegistryError::Api {
                error_code,
                message,
                ..
            } => {
                assert_eq!(error_code, "UNKNOWN");
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }
}
