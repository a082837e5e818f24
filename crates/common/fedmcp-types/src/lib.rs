//! FedMCP core data types.
//!
//! - [`Artifact`]: workspace-scoped, versioned JSON payload with a
//!   deterministic canonical byte form.
//! - [`CanonicalValue`]: the JSON value model used for artifact bodies.
//! - [`error`]: the error taxonomy shared by every FedMCP crate.
//! - [`audit`]: audit events recorded for artifact operations.

#![forbid(unsafe_code)]

pub mod artifact;
pub mod audit;
pub mod error;
pub mod value;

pub use artifact::{Artifact, ArtifactType, MAX_BODY_BYTES};
pub use audit::{AuditAction, AuditEvent};
pub use error::{
    ArtifactError, FedMcpError, InvalidReason, KeyMaterialError, SigningError, TransportError,
};
pub use value::CanonicalValue;
