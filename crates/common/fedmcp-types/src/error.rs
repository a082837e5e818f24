use fedmcp_crypto::JwsError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Malformed artifact input. Always raised before any cryptographic work.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Invalid workspace ID '{value}': {source}")]
    InvalidWorkspaceId {
        value: String,
        #[source]
        source: uuid::Error,
    },

    #[error("Artifact type must be a non-empty string")]
    InvalidType,

    #[error("Artifact version must be at least 1, found {0}")]
    InvalidVersion(u64),

    #[error("Artifact body is {size} bytes, exceeding the {limit} byte limit")]
    BodyTooLarge { size: usize, limit: usize },

    #[error("Malformed artifact JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors loading, generating, or persisting signing key material.
#[derive(Error, Debug)]
pub enum KeyMaterialError {
    #[error("No key material found at '{}'", path.display())]
    Missing { path: PathBuf },

    #[error("Corrupt key material at '{}': {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Key material already exists at '{}'", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Key material I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode key material: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Errors on the signing path. None of these produce a partial signature.
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("Signing unavailable: {0}")]
    Unavailable(#[from] KeyMaterialError),

    #[error("Refusing to sign invalid artifact: {0}")]
    InvalidArtifact(#[from] ArtifactError),

    #[error("Failed to encode signature token: {0}")]
    Jws(#[from] JwsError),
}

/// Coarse reason attached to an `Invalid` verification verdict.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    #[error("signature does not match the artifact content")]
    SignatureMismatch,

    #[error("token key ID does not match the trusted key")]
    KeyMismatch,

    #[error("token names an unsupported signature algorithm")]
    UnsupportedAlgorithm,

    #[error("token could not be parsed")]
    MalformedToken,
}

/// Failures talking to the remote artifact store.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid server URL '{0}'")]
    InvalidUrl(String),

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Server rejected request (HTTP {status}, reason '{reason}'): {message}")]
    Rejected {
        status: u16,
        reason: String,
        message: String,
    },

    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },
}

/// Top-level error for FedMCP operations.
#[derive(Error, Debug)]
pub enum FedMcpError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ArtifactError),

    #[error("Key material error: {0}")]
    KeyMaterial(#[from] KeyMaterialError),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Artifact is not trustworthy: {0}")]
    Verification(#[from] InvalidReason),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization/Deserialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FedMcpError {
    /// True when the artifact itself failed a trust check, as opposed to the
    /// operation failing for infrastructure or input reasons.
    pub fn is_trust_failure(&self) -> bool {
        matches!(self, FedMcpError::Verification(_))
    }
}
