use crate::artifact::Artifact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Tracing target for audit records, so they can be filtered or routed
/// independently of diagnostic logs.
pub const AUDIT_TARGET: &str = "fedmcp::audit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Read,
    Update,
    Delete,
    Verify,
    Sign,
    Export,
    Import,
    Push,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Read => "read",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Verify => "verify",
            AuditAction::Sign => "sign",
            AuditAction::Export => "export",
            AuditAction::Import => "import",
            AuditAction::Push => "push",
        }
    }
}

/// Who did what to which artifact, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    /// Service account, user, key ID, or system component.
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<Uuid>,
    pub workspace_id: Uuid,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, actor: impl Into<String>, workspace_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            actor: actor.into(),
            artifact_id: None,
            workspace_id,
            metadata: Map::new(),
        }
    }

    /// Event about `artifact`, scoped to its workspace.
    pub fn for_artifact(action: AuditAction, actor: impl Into<String>, artifact: &Artifact) -> Self {
        let mut event = Self::new(action, actor, artifact.workspace_id());
        event.artifact_id = Some(artifact.id());
        event
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Record the event as a structured `tracing` event on [`AUDIT_TARGET`].
    pub fn emit(&self) {
        let metadata = Value::Object(self.metadata.clone());
        tracing::info!(
            target: AUDIT_TARGET,
            event_id = %self.id,
            action = self.action.as_str(),
            actor = %self.actor,
            artifact_id = ?self.artifact_id,
            workspace_id = %self.workspace_id,
            metadata = %metadata,
            "audit event"
        );
    }
}
