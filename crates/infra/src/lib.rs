//! Infrastructure layer: persistence ports and adapters, configuration, and
//! the [`InvoiceEngine`] that ties them to the domain.

pub mod audit_log;
pub mod config;
pub mod engine;
pub mod invoice_store;

pub use audit_log::{InMemoryActorDirectory, InMemoryAuditStore};
pub use config::{ConfigError, EngineConfig};
pub use engine::{EngineError, InvoiceEngine, InvoiceView, Outcome, SubmissionReceipt, VendorStatement};
pub use invoice_store::{InMemoryInvoiceStore, InvoiceStore, InvoiceTx, StoreError};
