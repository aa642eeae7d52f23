//! Append-only audit records for lock/unlock actions.

use serde::{Deserialize, Serialize};

/// Who initiated a lock/unlock action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum AuditActor {
    /// The reconciliation engine acting on a schedule or admin trigger.
    System,
    /// A named operator using the manual override path.
    User(String),
}

impl AuditActor {
    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "system",
            Self::User(name) => name,
        }
    }
}

/// Kind of action being audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Block,
    Unblock,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Unblock => "unblock",
        }
    }
}

/// One audit line, emitted per automatic or manual action.
///
/// The log is append-only: the core never mutates or deletes entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor: AuditActor,
    pub action: AuditAction,
    /// Free text: device id, client name, sale id, days late or the manual
    /// override reason.
    pub details: String,
    pub tenant_id: Option<String>,
}
