use crate::{ArtifactVerifier, Did, DidError, JwkError, KeyId, PublicJwk, VerificationResult};
use ed25519_dalek::VerifyingKey;
use fedmcp_crypto::DetachedJws;
use fedmcp_types::{Artifact, InvalidReason};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Errors turning external key representations into a trusted key.
#[derive(Debug, Error)]
pub enum TrustedKeyError {
    #[error("invalid DID: {0}")]
    Did(#[from] DidError),

    #[error("invalid JWK: {0}")]
    Jwk(#[from] JwkError),

    #[error("invalid JWK JSON: {0}")]
    JwkJson(#[from] serde_json::Error),

    #[error("invalid hex public key: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid Ed25519 public key length: expected 32 bytes, found {0}")]
    InvalidKeyLength(usize),

    #[error("invalid Ed25519 public key: {0}")]
    InvalidKey(#[from] ed25519_dalek::SignatureError),
}

/// A public key the caller has decided to trust, with its derived key ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedKey {
    verifying_key: VerifyingKey,
    key_id: KeyId,
}

impl TrustedKey {
    pub fn from_verifying_key(verifying_key: VerifyingKey) -> Self {
        Self {
            key_id: KeyId::derive(&verifying_key),
            verifying_key,
        }
    }

    pub fn from_did(did: &str) -> Result<Self, TrustedKeyError> {
        let did: Did = did.parse()?;
        Ok(Self::from_verifying_key(did.to_ed25519()?))
    }

    /// 64 hex characters of raw Ed25519 public key.
    pub fn from_public_hex(hex_key: &str) -> Result<Self, TrustedKeyError> {
        let raw = hex::decode(hex_key.trim())?;
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| TrustedKeyError::InvalidKeyLength(raw.len()))?;
        Ok(Self::from_verifying_key(VerifyingKey::from_bytes(&bytes)?))
    }

    pub fn from_jwk(jwk: &PublicJwk) -> Result<Self, TrustedKeyError> {
        Ok(Self::from_verifying_key(jwk.to_verifying_key()?))
    }

    /// Accepts a `did:key`, a JWK JSON object, or a hex public key.
    pub fn parse(input: &str) -> Result<Self, TrustedKeyError> {
        let input = input.trim();
        if input.starts_with("did:") {
            Self::from_did(input)
        } else if input.starts_with('{') {
            let jwk: PublicJwk = serde_json::from_str(input)?;
            Self::from_jwk(&jwk)
        } else {
            Self::from_public_hex(input)
        }
    }

    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    pub fn did(&self) -> Did {
        Did::new_ed25519(&self.verifying_key)
    }
}

/// Set of trusted keys indexed by key ID.
///
/// Cheap to clone; clones share the same set. Lets a verifier pick the key a
/// token names instead of being handed one up front.
#[derive(Debug, Clone, Default)]
pub struct TrustedKeyRing {
    keys: Arc<RwLock<HashMap<KeyId, TrustedKey>>>,
}

impl TrustedKeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key, replacing any previous key with the same ID.
    pub fn register(&self, key: TrustedKey) -> KeyId {
        let key_id = key.key_id().clone();
        self.write().insert(key_id.clone(), key);
        key_id
    }

    pub fn remove(&self, key_id: &KeyId) -> Option<TrustedKey> {
        self.write().remove(key_id)
    }

    pub fn get(&self, key_id: &str) -> Option<TrustedKey> {
        self.read().get(key_id).cloned()
    }

    pub fn contains(&self, key_id: &str) -> bool {
        self.read().contains_key(key_id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Verify against whichever registered key the token names.
    ///
    /// A token naming no registered key is a key mismatch.
    pub fn verify(&self, artifact: &Artifact, token: &str) -> VerificationResult {
        let jws = match DetachedJws::parse(token.trim()) {
            Ok(jws) => jws,
            Err(_) => return VerificationResult::Invalid(InvalidReason::MalformedToken),
        };

        match jws.header.kid.as_deref().and_then(|kid| self.get(kid)) {
            Some(trusted) => ArtifactVerifier::new().verify(artifact, token, &trusted),
            None if !jws.header.alg.is_supported() => {
                VerificationResult::Invalid(InvalidReason::UnsupportedAlgorithm)
            }
            None => {
                tracing::debug!(token_kid = ?jws.header.kid, "Token names no trusted key");
                VerificationResult::Invalid(InvalidReason::KeyMismatch)
            }
        }
    }

    // Poisoning is ignored: entries are inserted whole.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<KeyId, TrustedKey>> {
        self.keys.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<KeyId, TrustedKey>> {
        self.keys.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
