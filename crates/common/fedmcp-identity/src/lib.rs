//! FedMCP identity: signing keys, artifact signer, artifact verifier.
//!
//! - Ed25519 key material with a stable short key ID and a `did:key` form.
//! - [`KeyStore`] loads or generates the local signing key on disk.
//! - [`LocalSigner`] produces compact detached JWS tokens over an artifact's
//!   canonical bytes.
//! - [`ArtifactVerifier`] and [`TrustedKeyRing`] check tokens against
//!   trusted public keys and report a coarse verdict.
//! - Zero `unsafe`; `#![forbid(unsafe_code)]`.

#![forbid(unsafe_code)]

mod did;
mod jwk;
mod key_id;
mod key_ring;
mod key_store;
mod keypair;
mod signer;
mod token;
mod verifier;
#[cfg(test)]
mod tests;

pub use did::{Did, DidError};
pub use jwk::{JwkError, PublicJwk};
pub use key_id::{KeyId, KEY_ID_HEX_LEN};
pub use key_ring::{TrustedKey, TrustedKeyError, TrustedKeyRing};
pub use key_store::{KeyStore, DEFAULT_KEY_FILE, FEDMCP_HOME_DIR, KEY_PATH_ENV};
pub use keypair::KeyMaterial;
pub use signer::{ArtifactSigner, LocalSigner};
pub use token::SignatureToken;
pub use verifier::{ArtifactVerifier, VerificationResult};
