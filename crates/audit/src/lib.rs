//! `invoicegate-audit`: append-only audit trail.
//!
//! Every mutating action is described by one [`AuditRecord`] carrying a
//! snapshot of the actor's name and role as they were at write time.
//! Writing goes through [`AuditTrail`], whose contract is that failures are
//! logged and swallowed, never propagated to the business operation.

pub mod action;
pub mod ports;
pub mod record;
pub mod recorder;

pub use action::AuditAction;
pub use ports::{ActorDirectory, ActorProfile, AuditError, AuditStore};
pub use record::{ActorSnapshot, AuditRecord, NewAuditRecord};
pub use recorder::{AuditRecorder, AuditTrail};
