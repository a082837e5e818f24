use fedmcp_crypto::{DetachedJws, JwsError, JwsHeader};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Compact detached JWS over an artifact's canonical bytes.
///
/// Carries no payload; the verifier recomputes it from the artifact. Holding
/// a `SignatureToken` says nothing about validity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureToken(String);

impl SignatureToken {
    pub(crate) fn new(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decoded protected header.
    pub fn header(&self) -> Result<JwsHeader, JwsError> {
        DetachedJws::parse(&self.0).map(|jws| jws.header)
    }

    /// The `kid` the token claims, if it decodes and names one.
    pub fn key_id(&self) -> Option<String> {
        self.header().ok().and_then(|header| header.kid)
    }
}

impl FromStr for SignatureToken {
    type Err = JwsError;

    /// Accepts only structurally well-formed detached tokens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        DetachedJws::parse(trimmed)?;
        Ok(Self(trimmed.to_string()))
    }
}

impl AsRef<str> for SignatureToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignatureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
