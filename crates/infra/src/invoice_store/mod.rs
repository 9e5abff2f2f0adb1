//! Transactional invoice persistence boundary.
//!
//! Admission checks and the insert that follows them must observe the same
//! snapshot, so every write goes through an [`InvoiceTx`] opened with
//! [`InvoiceStore::begin`].

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryInvoiceStore, InMemoryInvoiceTx};
pub use r#trait::{InvoiceStore, InvoiceTx, StoreError};
