//! In-memory adapters for the audit ports.

use std::collections::HashMap;
use std::sync::RwLock;

use invoicegate_audit::{ActorDirectory, ActorProfile, AuditError, AuditRecord, AuditStore, NewAuditRecord};
use invoicegate_auth::Role;
use invoicegate_core::{ActorId, AuditRecordId, InvoiceId};

/// Append-only audit log for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditStore for InMemoryAuditStore {
    fn append(&self, record: NewAuditRecord) -> Result<AuditRecord, AuditError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| AuditError::Storage("lock poisoned".to_string()))?;

        let id = AuditRecordId::new(records.len() as u64 + 1);
        let stored = AuditRecord::from_new(id, record);
        records.push(stored.clone());
        Ok(stored)
    }

    fn list_for_invoice(&self, invoice_id: InvoiceId) -> Result<Vec<AuditRecord>, AuditError> {
        let records = self
            .records
            .read()
            .map_err(|_| AuditError::Storage("lock poisoned".to_string()))?;

        Ok(records
            .iter()
            .filter(|r| r.invoice_id == Some(invoice_id))
            .cloned()
            .collect())
    }

    fn list_all(&self) -> Result<Vec<AuditRecord>, AuditError> {
        let records = self
            .records
            .read()
            .map_err(|_| AuditError::Storage("lock poisoned".to_string()))?;
        Ok(records.clone())
    }
}

/// Mutable actor registry for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryActorDirectory {
    profiles: RwLock<HashMap<ActorId, ActorProfile>>,
}

impl InMemoryActorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace (rename, role change) a profile.
    pub fn upsert(&self, id: ActorId, name: impl Into<String>, role: Role) {
        if let Ok(mut profiles) = self.profiles.write() {
            profiles.insert(
                id,
                ActorProfile {
                    id,
                    name: name.into(),
                    role,
                },
            );
        }
    }
}

impl ActorDirectory for InMemoryActorDirectory {
    fn lookup(&self, actor_id: ActorId) -> Result<Option<ActorProfile>, AuditError> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| AuditError::Directory("lock poisoned".to_string()))?;
        Ok(profiles.get(&actor_id).cloned())
    }
}
