use multibase::{decode, Base};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Ed25519 public key multicodec prefix (varint-encoded 0xed).
const ED25519_MULTICODEC_PREFIX: [u8; 2] = [0xed, 0x01];
const ED25519_KEY_LENGTH: usize = 32;

/// Error type for DID operations.
#[derive(Debug, Error)]
pub enum DidError {
    #[error("malformed DID string: expected 'did:key:z<base58btc>'")]
    Malformed,
    #[error("invalid multibase encoding in DID: {0}")]
    Encoding(String),
    #[error("unsupported key multicodec prefix {0:02x?}")]
    UnsupportedCodec(Vec<u8>),
    #[error("invalid key length: expected 32 bytes, found {0}")]
    InvalidKeyLength(usize),
    #[error("key bytes are not a valid Ed25519 public key: {0}")]
    InvalidKeyBytes(#[from] ed25519_dalek::SignatureError),
}

/// A `did:key` identifier for an Ed25519 public key.
///
/// Lets a party name a trusted signing key in one copy-pasteable string.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Construct a DID from an Ed25519 public key.
    pub fn new_ed25519(pk: &ed25519_dalek::VerifyingKey) -> Self {
        let mut bytes = Vec::with_capacity(ED25519_MULTICODEC_PREFIX.len() + ED25519_KEY_LENGTH);
        bytes.extend_from_slice(&ED25519_MULTICODEC_PREFIX);
        bytes.extend_from_slice(pk.as_bytes());

        let encoded = multibase::encode(Base::Base58Btc, bytes);
        Self(format!("did:key:{}", encoded))
    }

    /// Return the DID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode and return the embedded Ed25519 public key.
    pub fn to_ed25519(&self) -> Result<ed25519_dalek::VerifyingKey, DidError> {
        decode_ed25519(&self.0)
    }
}

fn decode_ed25519(did: &str) -> Result<ed25519_dalek::VerifyingKey, DidError> {
    let parts: Vec<&str> = did.split(':').collect();
    if parts.len() != 3 || parts[0] != "did" || parts[1] != "key" || !parts[2].starts_with('z') {
        return Err(DidError::Malformed);
    }
    let (_, data) = decode(parts[2]).map_err(|e| DidError::Encoding(e.to_string()))?;

    let key_bytes = data
        .strip_prefix(&ED25519_MULTICODEC_PREFIX[..])
        .ok_or_else(|| DidError::UnsupportedCodec(data.iter().take(2).copied().collect()))?;
    let bytes: [u8; ED25519_KEY_LENGTH] = key_bytes
        .try_into()
        .map_err(|_| DidError::InvalidKeyLength(key_bytes.len()))?;

    Ok(ed25519_dalek::VerifyingKey::from_bytes(&bytes)?)
}

impl FromStr for Did {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_ed25519(s)?;
        Ok(Did(s.to_string()))
    }
}

impl TryFrom<String> for Did {
    type Error = DidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        decode_ed25519(&value)?;
        Ok(Did(value))
    }
}

impl From<Did> for String {
    fn from(value: Did) -> Self {
        value.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
