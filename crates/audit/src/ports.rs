//! Storage seams used by the recorder.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use invoicegate_auth::Role;
use invoicegate_core::{ActorId, InvoiceId};

use crate::record::{AuditRecord, NewAuditRecord};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("audit storage error: {0}")]
    Storage(String),

    #[error("actor directory unavailable: {0}")]
    Directory(String),
}

/// Live profile of an acting identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorProfile {
    pub id: ActorId,
    pub name: String,
    pub role: Role,
}

/// Append-only audit log storage.
pub trait AuditStore: Send + Sync {
    /// Persist a record and assign its id. Records are never updated afterwards.
    fn append(&self, record: NewAuditRecord) -> Result<AuditRecord, AuditError>;

    /// Records for one invoice, in write order.
    fn list_for_invoice(&self, invoice_id: InvoiceId) -> Result<Vec<AuditRecord>, AuditError>;

    /// Every record, in write order.
    fn list_all(&self) -> Result<Vec<AuditRecord>, AuditError>;
}

/// Lookup of actor profiles for snapshotting.
pub trait ActorDirectory: Send + Sync {
    fn lookup(&self, actor_id: ActorId) -> Result<Option<ActorProfile>, AuditError>;
}

impl<S> AuditStore for Arc<S>
where
    S: AuditStore + ?Sized,
{
    fn append(&self, record: NewAuditRecord) -> Result<AuditRecord, AuditError> {
        (**self).append(record)
    }

    fn list_for_invoice(&self, invoice_id: InvoiceId) -> Result<Vec<AuditRecord>, AuditError> {
        (**self).list_for_invoice(invoice_id)
    }

    fn list_all(&self) -> Result<Vec<AuditRecord>, AuditError> {
        (**self).list_all()
    }
}

impl<D> ActorDirectory for Arc<D>
where
    D: ActorDirectory + ?Sized,
{
    fn lookup(&self, actor_id: ActorId) -> Result<Option<ActorProfile>, AuditError> {
        (**self).lookup(actor_id)
    }
}
