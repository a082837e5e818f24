use crate::TrustedKey;
use fedmcp_crypto::DetachedJws;
use fedmcp_types::{Artifact, FedMcpError, InvalidReason};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict of checking a token against an artifact and a trusted key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum VerificationResult {
    Valid,
    Invalid(InvalidReason),
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationResult::Valid)
    }

    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            VerificationResult::Valid => None,
            VerificationResult::Invalid(reason) => Some(*reason),
        }
    }

    /// `Ok(())` for `Valid`, the reason as a trust failure otherwise.
    pub fn into_result(self) -> Result<(), FedMcpError> {
        match self {
            VerificationResult::Valid => Ok(()),
            VerificationResult::Invalid(reason) => Err(FedMcpError::Verification(reason)),
        }
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationResult::Valid => f.write_str("VALID"),
            VerificationResult::Invalid(reason) => write!(f, "INVALID ({reason})"),
        }
    }
}

/// Checks artifact signatures against a caller-supplied trusted key.
///
/// Verification steps run in a fixed order: parse the token, recompute the
/// canonical bytes, then check algorithm, key ID and signature. An
/// unparseable token is reported immediately. Otherwise every check is
/// evaluated in that fixed order and the first failing one becomes the
/// verdict. Details beyond the coarse reason go to the debug log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactVerifier;

impl ArtifactVerifier {
    pub fn new() -> Self {
        Self
    }

    pub fn verify(&self, artifact: &Artifact, token: &str, trusted: &TrustedKey) -> VerificationResult {
        let jws = match DetachedJws::parse(token.trim()) {
            Ok(jws) => jws,
            Err(e) => {
                tracing::debug!(artifact_id = %artifact.id(), error = %e, "Token parse failed");
                return VerificationResult::Invalid(InvalidReason::MalformedToken);
            }
        };

        let payload = artifact.canonical_bytes();

        let algorithm_ok = jws.header.alg.is_supported();

        let token_kid = jws.header.kid.as_deref();
        let key_ok = token_kid.is_some_and(|kid| trusted.key_id() == kid);

        let signature = jws.verify(&payload, trusted.verifying_key());

        let verdict = if !algorithm_ok {
            tracing::debug!(alg = %jws.header.alg, "Unsupported token algorithm");
            VerificationResult::Invalid(InvalidReason::UnsupportedAlgorithm)
        } else if !key_ok {
            tracing::debug!(
                token_kid = ?token_kid,
                trusted_kid = %trusted.key_id(),
                "Token key ID does not match trusted key"
            );
            VerificationResult::Invalid(InvalidReason::KeyMismatch)
        } else {
            match signature {
                Ok(()) => VerificationResult::Valid,
                Err(e) => {
                    tracing::debug!(error = %e, "Signature check failed");
                    VerificationResult::Invalid(InvalidReason::SignatureMismatch)
                }
            }
        };

        tracing::debug!(artifact_id = %artifact.id(), %verdict, "Verified artifact");
        verdict
    }
}
