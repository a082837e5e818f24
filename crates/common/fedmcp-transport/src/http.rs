use crate::{ArtifactTransport, PushAck, PushRequest, StoredArtifact};
use async_trait::async_trait;
use fedmcp_identity::SignatureToken;
use fedmcp_types::{Artifact, TransportError};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Header naming the workspace every request is scoped to.
pub const WORKSPACE_HEADER: &str = "X-Workspace-ID";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body the store returns on a rejected request.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Talks to a FedMCP store over HTTP.
#[derive(Debug, Clone)]
pub struct HttpArtifactTransport {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpArtifactTransport {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base = base_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(TransportError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request {
                url: base.to_string(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base.to_string(),
            api_key: None,
        })
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn artifacts_url(&self, workspace_id: Uuid) -> String {
        format!("{}/workspaces/{}/artifacts", self.base_url, workspace_id)
    }

    fn request(&self, builder: reqwest::RequestBuilder, workspace_id: Uuid) -> reqwest::RequestBuilder {
        let builder = builder.header(WORKSPACE_HEADER, workspace_id.to_string());
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder, url: &str) -> Result<Response, TransportError> {
        builder.send().await.map_err(|e| TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Turn a response into `T`, or a `Rejected` error for any non-2xx status.
async fn read_response<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, TransportError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(|e| TransportError::Request {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    if !status.is_success() {
        let rejected = rejection(status, &bytes);
        tracing::warn!(%url, status = status.as_u16(), error = %rejected, "Store rejected request");
        return Err(rejected);
    }

    serde_json::from_slice(&bytes).map_err(|e| TransportError::InvalidResponse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn rejection(status: StatusCode, body: &[u8]) -> TransportError {
    let parsed = serde_json::from_slice::<ErrorBody>(body).ok();
    let reason = parsed
        .as_ref()
        .and_then(|b| b.error.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let message = parsed
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                status.canonical_reason().unwrap_or("no response body").to_string()
            } else {
                text
            }
        });

    TransportError::Rejected {
        status: status.as_u16(),
        reason,
        message,
    }
}

#[async_trait]
impl ArtifactTransport for HttpArtifactTransport {
    async fn push(&self, artifact: &Artifact, token: &SignatureToken) -> Result<PushAck, TransportError> {
        let workspace_id = artifact.workspace_id();
        let url = self.artifacts_url(workspace_id);
        tracing::debug!(%url, artifact_id = %artifact.id(), "Pushing artifact");

        let body = PushRequest {
            artifact,
            jws: token.as_str(),
        };
        let builder = self.request(self.client.post(&url), workspace_id).json(&body);
        let response = self.send(builder, &url).await?;
        let ack: PushAck = read_response(response, &url).await?;

        tracing::info!(artifact_id = %ack.artifact_id, stored_at = %ack.stored_at, "Artifact stored");
        Ok(ack)
    }

    async fn fetch(&self, workspace_id: Uuid, artifact_id: Uuid) -> Result<StoredArtifact, TransportError> {
        let url = format!("{}/{}", self.artifacts_url(workspace_id), artifact_id);
        tracing::debug!(%url, "Fetching artifact");

        let builder = self.request(self.client.get(&url), workspace_id);
        let response = self.send(builder, &url).await?;
        read_response(response, &url).await
    }
}
