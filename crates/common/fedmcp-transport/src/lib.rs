//! Transport adapter for shipping signed artifacts to a FedMCP workspace store.
//!
//! The core never talks to the network; this crate is the one boundary that
//! does. Failures surface as [`TransportError`], distinct from verification
//! verdicts.

mod http;

pub use http::{HttpArtifactTransport, DEFAULT_TIMEOUT, WORKSPACE_HEADER};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fedmcp_identity::SignatureToken;
use fedmcp_types::{Artifact, TransportError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body of a push: the artifact and its detached token.
#[derive(Debug, Clone, Serialize)]
pub struct PushRequest<'a> {
    pub artifact: &'a Artifact,
    pub jws: &'a str,
}

/// Acknowledgment returned by the store after a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushAck {
    #[serde(alias = "artifact_id")]
    pub artifact_id: Uuid,
    #[serde(alias = "stored_at")]
    pub stored_at: DateTime<Utc>,
}

/// An artifact as held by the store, with the token it was pushed with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub artifact: Artifact,
    pub jws: Option<String>,
}

/// Ships artifacts somewhere. No retry logic; callers own that policy.
#[async_trait]
pub trait ArtifactTransport: Send + Sync {
    async fn push(&self, artifact: &Artifact, token: &SignatureToken) -> Result<PushAck, TransportError>;

    async fn fetch(&self, workspace_id: Uuid, artifact_id: Uuid) -> Result<StoredArtifact, TransportError>;
}
