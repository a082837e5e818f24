use crate::{Did, KeyId, PublicJwk, TrustedKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use zeroize::Zeroizing;

/// Ed25519 signing key pair with its derived key ID and DID.
///
/// Immutable once constructed. Share it behind an `Arc`; the secret half is
/// only reachable from inside this crate and zeroized on drop.
#[derive(Clone)]
pub struct KeyMaterial {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    key_id: KeyId,
    did: Did,
}

impl KeyMaterial {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Deterministic key pair from a 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            key_id: KeyId::derive(&verifying_key),
            did: Did::new_ed25519(&verifying_key),
            signing_key,
            verifying_key,
        }
    }

    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    pub fn public_jwk(&self) -> PublicJwk {
        PublicJwk::from_verifying_key(&self.verifying_key)
    }

    /// The public half as a verifier-side trust anchor.
    pub fn trusted_key(&self) -> TrustedKey {
        TrustedKey::from_verifying_key(self.verifying_key)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub(crate) fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_id", &self.key_id)
            .field("did", &self.did)
            .finish_non_exhaustive()
    }
}
