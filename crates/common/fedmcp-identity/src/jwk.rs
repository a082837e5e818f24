use crate::KeyId;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JwkError {
    #[error("unsupported JWK: kty '{kty}', crv '{crv}' (expected OKP / Ed25519)")]
    UnsupportedKeyType { kty: String, crv: String },
    #[error("invalid base64url in JWK 'x': {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid Ed25519 key length in JWK: expected 32 bytes, found {0}")]
    InvalidKeyLength(usize),
    #[error("JWK key bytes are not a valid Ed25519 public key: {0}")]
    InvalidKeyBytes(#[from] ed25519_dalek::SignatureError),
    #[error("JWK declares kid '{declared}' but the key derives '{derived}'")]
    KeyIdMismatch { declared: String, derived: String },
}

/// Ed25519 public key as an RFC 8037 OKP JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicJwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
}

impl PublicJwk {
    pub fn from_verifying_key(public_key: &VerifyingKey) -> Self {
        Self {
            kty: "OKP".to_string(),
            crv: "Ed25519".to_string(),
            x: URL_SAFE_NO_PAD.encode(public_key.as_bytes()),
            kid: Some(KeyId::derive(public_key).to_string()),
            use_: Some("sig".to_string()),
            alg: Some("EdDSA".to_string()),
        }
    }

    /// Decode the key. A `kid`, when present, must match the derived key ID.
    pub fn to_verifying_key(&self) -> Result<VerifyingKey, JwkError> {
        if self.kty != "OKP" || self.crv != "Ed25519" {
            return Err(JwkError::UnsupportedKeyType {
                kty: self.kty.clone(),
                crv: self.crv.clone(),
            });
        }
        let raw = URL_SAFE_NO_PAD.decode(&self.x)?;
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| JwkError::InvalidKeyLength(raw.len()))?;
        let key = VerifyingKey::from_bytes(&bytes)?;

        if let Some(declared) = &self.kid {
            let derived = KeyId::derive(&key);
            if derived.as_str() != declared {
                return Err(JwkError::KeyIdMismatch {
                    declared: declared.clone(),
                    derived: derived.to_string(),
                });
            }
        }
        Ok(key)
    }
}
