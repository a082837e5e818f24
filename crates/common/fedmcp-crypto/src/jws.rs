use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{Signature, SignatureError as Ed25519SignatureError, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// `typ` header value carried by every FedMCP artifact signature.
pub const JWS_TYPE: &str = "JOSE";

const ED25519_SIGNATURE_LENGTH: usize = 64;

/// Error types for JWS operations
#[derive(Error, Debug)]
pub enum JwsError {
    #[error("Failed to serialize or parse JWS header: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Base64 encoding/decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid JWS structure: expected 3 parts separated by '.', found {actual_parts} parts")]
    IncorrectJwsPartsCount { actual_parts: usize },

    #[error("Invalid detached JWS: payload part was expected to be empty but was not")]
    PayloadPresentInDetachedJws,

    #[error("Invalid signature length: expected {expected_len} bytes, found {found_len} bytes")]
    InvalidSignatureLength { expected_len: usize, found_len: usize },

    #[error("Unsupported JWS algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Cryptographic signature verification failed: {0}")]
    CryptoVerification(#[from] Ed25519SignatureError),
}

impl JwsError {
    /// True when the token itself could not be decoded, as opposed to a
    /// well-formed token whose algorithm or signature does not check out.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            JwsError::Serialization(_)
                | JwsError::Base64(_)
                | JwsError::IncorrectJwsPartsCount { .. }
                | JwsError::PayloadPresentInDetachedJws
                | JwsError::InvalidSignatureLength { .. }
        )
    }
}

/// Result type for JWS operations
pub type Result<T> = std::result::Result<T, JwsError>;

/// JWS `alg` header value.
///
/// Only `EdDSA` (Ed25519, RFC 8037) is implemented. Any other value is kept
/// verbatim so callers can report exactly what a token claimed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Algorithm {
    EdDSA,
    Other(String),
}

impl Algorithm {
    pub fn as_str(&self) -> &str {
        match self {
            Algorithm::EdDSA => "EdDSA",
            Algorithm::Other(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Algorithm::EdDSA)
    }
}

impl From<String> for Algorithm {
    fn from(value: String) -> Self {
        match value.as_str() {
            "EdDSA" => Algorithm::EdDSA,
            _ => Algorithm::Other(value),
        }
    }
}

impl From<Algorithm> for String {
    fn from(value: Algorithm) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWS protected header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    pub alg: Algorithm,

    /// Identifier of the key that produced the signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl JwsHeader {
    pub fn ed25519(kid: &str) -> Self {
        Self {
            alg: Algorithm::EdDSA,
            kid: Some(kid.to_string()),
            typ: Some(JWS_TYPE.to_string()),
        }
    }
}

/// A decoded detached JWS (`<header>..<signature>`).
///
/// Parsing only checks structure. Nothing about the signature is trusted
/// until [`DetachedJws::verify`] succeeds against a caller-chosen key.
#[derive(Debug, Clone)]
pub struct DetachedJws {
    pub header: JwsHeader,
    header_b64: String,
    signature: Vec<u8>,
}

impl DetachedJws {
    /// Decode a compact detached JWS string.
    pub fn parse(detached_jws: &str) -> Result<Self> {
        let parts: Vec<&str> = detached_jws.split('.').collect();
        if parts.len() != 3 {
            return Err(JwsError::IncorrectJwsPartsCount { actual_parts: parts.len() });
        }
        if !parts[1].is_empty() {
            return Err(JwsError::PayloadPresentInDetachedJws);
        }

        let header_b64 = parts[0];
        let header_json = URL_SAFE_NO_PAD.decode(header_b64)?;
        let header: JwsHeader = serde_json::from_slice(&header_json)?;
        let signature = URL_SAFE_NO_PAD.decode(parts[2])?;
        if signature.len() != ED25519_SIGNATURE_LENGTH {
            return Err(JwsError::InvalidSignatureLength {
                expected_len: ED25519_SIGNATURE_LENGTH,
                found_len: signature.len(),
            });
        }

        Ok(Self {
            header,
            header_b64: header_b64.to_string(),
            signature,
        })
    }

    pub fn signature_bytes(&self) -> &[u8] {
        &self.signature
    }

    /// Reconstitute the JWS signing input for `payload`.
    pub fn signing_input(&self, payload: &[u8]) -> String {
        format!("{}.{}", self.header_b64, URL_SAFE_NO_PAD.encode(payload))
    }

    /// Check the signature over `payload` with `public_key`.
    pub fn verify(&self, payload: &[u8], public_key: &VerifyingKey) -> Result<()> {
        if !self.header.alg.is_supported() {
            return Err(JwsError::UnsupportedAlgorithm(self.header.alg.to_string()));
        }

        let signature_array: &[u8; ED25519_SIGNATURE_LENGTH] = self
            .signature
            .as_slice()
            .try_into()
            .map_err(|_| JwsError::InvalidSignatureLength {
                expected_len: ED25519_SIGNATURE_LENGTH,
                found_len: self.signature.len(),
            })?;
        let signature = Signature::from_bytes(signature_array);

        let signing_input = self.signing_input(payload);
        public_key
            .verify_strict(signing_input.as_bytes(), &signature)
            .map_err(JwsError::from)
    }
}

/// Sign `payload` and return a detached JWS naming `kid` in its header.
///
/// Returns a string in the format: `<base64url(header)>..<base64url(signature)>`
/// The payload is not included in the detached JWS.
pub fn sign_detached_jws(payload: &[u8], keypair: &SigningKey, kid: &str) -> Result<String> {
    let header = JwsHeader::ed25519(kid);
    let header_json = serde_json::to_vec(&header)?;
    let header_b64 = URL_SAFE_NO_PAD.encode(header_json);

    let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
    let signing_input = format!("{}.{}", header_b64, payload_b64);

    let signature = keypair.sign(signing_input.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(signature.to_bytes());

    Ok(format!("{}..{}", header_b64, signature_b64))
}

/// Verify a detached JWS against the original payload
///
/// Takes a detached JWS in the format: `<base64url(header)>..<base64url(signature)>`
/// and the original payload to verify.
pub fn verify_detached_jws(
    payload: &[u8],
    detached_jws: &str,
    public_key: &VerifyingKey,
) -> Result<()> {
    DetachedJws::parse(detached_jws)?.verify(payload, public_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_serializes_in_fixed_field_order() {
        let header = JwsHeader::ed25519("0123456789abcdef");
        let json = serde_json::to_string(&header).unwrap();
        assert_eq!(json, r#"{"alg":"EdDSA","kid":"0123456789abcdef","typ":"JOSE"}"#);
    }

    #[test]
    fn unknown_algorithm_is_preserved() {
        let header: JwsHeader = serde_json::from_str(r#"{"alg":"none"}"#).unwrap();
        assert_eq!(header.alg, Algorithm::Other("none".into()));
        assert!(!header.alg.is_supported());
        assert_eq!(header.kid, None);
    }
}
