//! Best-effort audit recording.
//!
//! Business operations never fail because their audit record could not be
//! written. Failures are logged and reported as `None` to the caller.

use std::sync::Arc;

use invoicegate_core::{ActorId, Clock, InvoiceId};

use crate::action::AuditAction;
use crate::ports::{ActorDirectory, AuditError, AuditStore};
use crate::record::{ActorSnapshot, AuditRecord, NewAuditRecord};

/// Write/read access to the audit log as seen by business operations.
pub trait AuditTrail: Send + Sync {
    /// Record an action. Never propagates a failure; returns `None` when the
    /// record could not be written.
    fn record(
        &self,
        actor: Option<ActorId>,
        action: AuditAction,
        invoice_id: Option<InvoiceId>,
        comment: Option<String>,
    ) -> Option<AuditRecord>;

    /// Records for one invoice, in write order.
    fn history(&self, invoice_id: InvoiceId) -> Result<Vec<AuditRecord>, AuditError>;
}

impl<T> AuditTrail for Arc<T>
where
    T: AuditTrail + ?Sized,
{
    fn record(
        &self,
        actor: Option<ActorId>,
        action: AuditAction,
        invoice_id: Option<InvoiceId>,
        comment: Option<String>,
    ) -> Option<AuditRecord> {
        (**self).record(actor, action, invoice_id, comment)
    }

    fn history(&self, invoice_id: InvoiceId) -> Result<Vec<AuditRecord>, AuditError> {
        (**self).history(invoice_id)
    }
}

/// Snapshots the actor's current name and role into each record.
#[derive(Debug, Clone)]
pub struct AuditRecorder<S, D, C> {
    store: S,
    directory: D,
    clock: C,
}

impl<S, D, C> AuditRecorder<S, D, C>
where
    S: AuditStore,
    D: ActorDirectory,
    C: Clock,
{
    pub fn new(store: S, directory: D, clock: C) -> Self {
        Self { store, directory, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn snapshot(&self, actor: Option<ActorId>) -> ActorSnapshot {
        let Some(actor_id) = actor else {
            return ActorSnapshot::system(None);
        };

        match self.directory.lookup(actor_id) {
            Ok(Some(profile)) => ActorSnapshot {
                actor_id: Some(actor_id),
                name: profile.name,
                role: profile.role.as_str().to_string(),
            },
            Ok(None) => {
                tracing::debug!(actor_id = %actor_id, "actor not found; recording as System");
                ActorSnapshot::system(Some(actor_id))
            }
            Err(err) => {
                tracing::warn!(actor_id = %actor_id, error = %err, "actor lookup failed; recording as System");
                ActorSnapshot::system(Some(actor_id))
            }
        }
    }
}

impl<S, D, C> AuditTrail for AuditRecorder<S, D, C>
where
    S: AuditStore,
    D: ActorDirectory,
    C: Clock,
{
    fn record(
        &self,
        actor: Option<ActorId>,
        action: AuditAction,
        invoice_id: Option<InvoiceId>,
        comment: Option<String>,
    ) -> Option<AuditRecord> {
        let record = NewAuditRecord {
            action,
            invoice_id,
            actor: self.snapshot(actor),
            comment,
            timestamp: self.clock.now(),
        };

        match self.store.append(record) {
            Ok(stored) => {
                tracing::debug!(
                    audit_id = %stored.id,
                    action = %action,
                    invoice_id = ?invoice_id.map(|id| id.get()),
                    "audit record written"
                );
                Some(stored)
            }
            Err(err) => {
                tracing::error!(
                    action = %action,
                    invoice_id = ?invoice_id.map(|id| id.get()),
                    error = %err,
                    "failed to write audit record"
                );
                None
            }
        }
    }

    fn history(&self, invoice_id: InvoiceId) -> Result<Vec<AuditRecord>, AuditError> {
        self.store.list_for_invoice(invoice_id)
    }
}
