use crate::error::ArtifactError;
use crate::value::{write_canonical_str, CanonicalValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Upper bound on the canonical encoding of an artifact body (1 MiB).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Well-known artifact type tags. Any non-empty tag is accepted.
pub struct ArtifactType;

impl ArtifactType {
    pub const SSP_FRAGMENT: &'static str = "ssp_fragment";
    pub const POAM_TEMPLATE: &'static str = "poam_template";
    pub const AGENT_RECIPE: &'static str = "agent_recipe";
    pub const BASELINE_MODULE: &'static str = "baseline_module";
    pub const AUDIT_SCRIPT: &'static str = "audit_script";

    // Healthcare extensions
    pub const RAG_QUERY: &'static str = "rag_query";
    pub const LLM_COMPLETION: &'static str = "llm_completion";
    pub const TOOL_INVOCATION: &'static str = "tool_invocation";

    pub const ALL: [&'static str; 8] = [
        Self::SSP_FRAGMENT,
        Self::POAM_TEMPLATE,
        Self::AGENT_RECIPE,
        Self::BASELINE_MODULE,
        Self::AUDIT_SCRIPT,
        Self::RAG_QUERY,
        Self::LLM_COMPLETION,
        Self::TOOL_INVOCATION,
    ];

    pub fn is_well_known(tag: &str) -> bool {
        Self::ALL.contains(&tag)
    }
}

/// A versioned, workspace-scoped JSON payload.
///
/// Fields are private: `id`, `type`, `workspaceId`, `body` and `createdAt`
/// never change after construction. The only supported change is
/// [`Artifact::with_version`] on a value the caller still owns, which models
/// a revision of the same lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawArtifact")]
pub struct Artifact {
    id: Uuid,
    #[serde(rename = "type")]
    artifact_type: String,
    workspace_id: Uuid,
    version: u64,
    body: CanonicalValue,
    created_at: DateTime<Utc>,
}

/// Wire form accepted on input; validated into an [`Artifact`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    id: Uuid,
    #[serde(rename = "type")]
    artifact_type: String,
    workspace_id: String,
    #[serde(default = "default_version")]
    version: u64,
    #[serde(alias = "jsonBody")]
    body: CanonicalValue,
    created_at: DateTime<Utc>,
}

fn default_version() -> u64 {
    1
}

impl TryFrom<RawArtifact> for Artifact {
    type Error = ArtifactError;

    fn try_from(raw: RawArtifact) -> Result<Self, Self::Error> {
        let artifact = Artifact {
            id: raw.id,
            artifact_type: raw.artifact_type,
            workspace_id: parse_workspace_id(&raw.workspace_id)?,
            version: raw.version,
            body: raw.body,
            created_at: raw.created_at,
        };
        artifact.validate()?;
        Ok(artifact)
    }
}

/// Parse a workspace identifier, rejecting anything that is not a UUID.
pub fn parse_workspace_id(value: &str) -> Result<Uuid, ArtifactError> {
    Uuid::parse_str(value.trim()).map_err(|source| ArtifactError::InvalidWorkspaceId {
        value: value.to_string(),
        source,
    })
}

impl Artifact {
    /// Create a new artifact with a fresh id, `version = 1` and `createdAt = now`.
    pub fn new(
        artifact_type: impl Into<String>,
        workspace_id: &str,
        body: impl Into<CanonicalValue>,
    ) -> Result<Self, ArtifactError> {
        let workspace_id = parse_workspace_id(workspace_id)?;
        Self::for_workspace(artifact_type, workspace_id, body)
    }

    /// Same as [`Artifact::new`] for an already-parsed workspace id.
    pub fn for_workspace(
        artifact_type: impl Into<String>,
        workspace_id: Uuid,
        body: impl Into<CanonicalValue>,
    ) -> Result<Self, ArtifactError> {
        let artifact = Artifact {
            id: Uuid::new_v4(),
            artifact_type: artifact_type.into(),
            workspace_id,
            version: 1,
            body: body.into(),
            created_at: Utc::now(),
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Set the revision number. Versions start at 1.
    pub fn with_version(mut self, version: u64) -> Result<Self, ArtifactError> {
        self.set_version(version)?;
        Ok(self)
    }

    pub fn set_version(&mut self, version: u64) -> Result<(), ArtifactError> {
        if version == 0 {
            return Err(ArtifactError::InvalidVersion(version));
        }
        self.version = version;
        Ok(())
    }

    /// Parse and validate an artifact from its JSON encoding.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn artifact_type(&self) -> &str {
        &self.artifact_type
    }

    pub fn workspace_id(&self) -> Uuid {
        self.workspace_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn body(&self) -> &CanonicalValue {
        &self.body
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Check every invariant that signing relies on.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.artifact_type.trim().is_empty() {
            return Err(ArtifactError::InvalidType);
        }
        if self.version == 0 {
            return Err(ArtifactError::InvalidVersion(self.version));
        }
        let size = self.body.to_canonical_bytes().len();
        if size > MAX_BODY_BYTES {
            return Err(ArtifactError::BodyTooLarge {
                size,
                limit: MAX_BODY_BYTES,
            });
        }
        Ok(())
    }

    /// Deterministic signing bytes over `(body, type, version, workspaceId)`.
    ///
    /// Compact JSON object, keys in byte order, body encoded by
    /// [`CanonicalValue::write_canonical`]. `id` and `createdAt` are not
    /// covered: a token binds the artifact's content, not its identity, so a
    /// verified signature says nothing about `id`.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128);
        out.extend_from_slice(b"{\"body\":");
        self.body.write_canonical(&mut out);
        out.extend_from_slice(b",\"type\":");
        write_canonical_str(&self.artifact_type, &mut out);
        out.extend_from_slice(b",\"version\":");
        out.extend_from_slice(self.version.to_string().as_bytes());
        out.extend_from_slice(b",\"workspaceId\":");
        write_canonical_str(&self.workspace_id.hyphenated().to_string(), &mut out);
        out.push(b'}');
        out
    }

    /// Lowercase hex SHA-256 of [`Artifact::canonical_bytes`].
    pub fn content_digest(&self) -> String {
        hex::encode(Sha256::digest(self.canonical_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const WORKSPACE: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    #[test]
    fn canonical_bytes_layout() {
        let artifact = Artifact::new("policy", WORKSPACE, json!({"rule": "deny-all"})).unwrap();
        assert_eq!(
            String::from_utf8(artifact.canonical_bytes()).unwrap(),
            r#"{"body":{"rule":"deny-all"},"type":"policy","version":1,"workspaceId":"3fa85f64-5717-4562-b3fc-2c963f66afa6"}"#
        );
    }

    #[test]
    fn uppercase_workspace_id_canonicalizes_lowercase() {
        let lower = Artifact::new("policy", WORKSPACE, json!({})).unwrap();
        let upper = Artifact::new("policy", &WORKSPACE.to_uppercase(), json!({})).unwrap();
        assert_eq!(lower.canonical_bytes(), upper.canonical_bytes());
    }

    #[test]
    fn version_zero_rejected() {
        let artifact = Artifact::new("policy", WORKSPACE, json!({})).unwrap();
        assert!(matches!(artifact.with_version(0), Err(ArtifactError::InvalidVersion(0))));

        let mut artifact = Artifact::new("policy", WORKSPACE, json!({})).unwrap();
        assert!(artifact.set_version(0).is_err());
        assert_eq!(artifact.version(), 1);
        artifact.set_version(3).unwrap();
        assert_eq!(artifact.version(), 3);
    }

    #[test]
    fn digest_is_sha256_hex() {
        let artifact = Artifact::new(ArtifactType::SSP_FRAGMENT, WORKSPACE, json!({"control": "AC-1"})).unwrap();
        let digest = artifact.content_digest();
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, artifact.content_digest());
    }
}
