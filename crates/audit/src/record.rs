use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoicegate_core::{ActorId, AuditRecordId, Entity, InvoiceId};

use crate::action::AuditAction;

/// Placeholder used when the acting identity cannot be resolved.
pub const SYSTEM_ACTOR: &str = "System";

/// Actor identity frozen at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    /// `None` for system-originated actions.
    pub actor_id: Option<ActorId>,
    pub name: String,
    pub role: String,
}

impl ActorSnapshot {
    pub fn system(actor_id: Option<ActorId>) -> Self {
        Self {
            actor_id,
            name: SYSTEM_ACTOR.to_string(),
            role: SYSTEM_ACTOR.to_string(),
        }
    }
}

/// A record ready to be appended (not yet assigned an id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuditRecord {
    pub action: AuditAction,
    pub invoice_id: Option<InvoiceId>,
    pub actor: ActorSnapshot,
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Immutable audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditRecordId,
    pub action: AuditAction,
    pub invoice_id: Option<InvoiceId>,
    pub actor: ActorSnapshot,
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn from_new(id: AuditRecordId, new: NewAuditRecord) -> Self {
        Self {
            id,
            action: new.action,
            invoice_id: new.invoice_id,
            actor: new.actor,
            comment: new.comment,
            timestamp: new.timestamp,
        }
    }
}

impl Entity for AuditRecord {
    type Id = AuditRecordId;

    fn id(&self) -> AuditRecordId {
        self.id
    }
}
