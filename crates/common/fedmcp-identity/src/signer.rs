use crate::{KeyId, KeyMaterial, KeyStore, SignatureToken};
use fedmcp_crypto::sign_detached_jws;
use fedmcp_types::{Artifact, SigningError};
use std::sync::Arc;

/// Something that can sign artifacts.
///
/// Implementations must be safe to share across threads; signing is a pure
/// function of the key and the artifact's canonical bytes.
pub trait ArtifactSigner: Send + Sync {
    fn sign(&self, artifact: &Artifact) -> Result<SignatureToken, SigningError>;

    /// Key ID written into every token this signer produces.
    fn key_id(&self) -> &KeyId;
}

/// Signs with key material held in this process.
#[derive(Debug, Clone)]
pub struct LocalSigner {
    key: Arc<KeyMaterial>,
}

impl LocalSigner {
    pub fn new(key: Arc<KeyMaterial>) -> Self {
        Self { key }
    }

    /// Signer backed by the store's key, generating it on first use.
    pub fn from_store(store: &KeyStore) -> Result<Self, SigningError> {
        let key = store.load_or_generate()?;
        Ok(Self::new(Arc::new(key)))
    }

    pub fn key_material(&self) -> &Arc<KeyMaterial> {
        &self.key
    }
}

impl ArtifactSigner for LocalSigner {
    fn sign(&self, artifact: &Artifact) -> Result<SignatureToken, SigningError> {
        artifact.validate()?;
        let payload = artifact.canonical_bytes();
        let token = sign_detached_jws(&payload, self.key.signing_key(), self.key.key_id().as_str())?;

        tracing::debug!(
            artifact_id = %artifact.id(),
            key_id = %self.key.key_id(),
            payload_len = payload.len(),
            "Signed artifact"
        );
        Ok(SignatureToken::new(token))
    }

    fn key_id(&self) -> &KeyId {
        self.key.key_id()
    }
}
