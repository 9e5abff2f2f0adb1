use chrono::{DateTime, Utc};
use thiserror::Error;

use invoicegate_core::{ExpectedVersion, InvoiceId, VendorId};
use invoicegate_invoicing::{AdmissionLookup, Invoice, NewInvoice};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// `(vendor_id, invoice_no)` is already taken.
    #[error("invoice number {invoice_no} already exists for vendor {vendor_id}")]
    UniqueViolation { vendor_id: VendorId, invoice_no: String },

    #[error("invoice {0} not found")]
    NotFound(InvoiceId),

    /// Optimistic concurrency failure (stale version).
    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::UniqueViolation { .. } => "unique_violation",
            StoreError::NotFound(_) => "not_found",
            StoreError::Concurrency(_) => "concurrency_conflict",
            StoreError::Backend(_) => "storage_error",
        }
    }
}

/// Invoice persistence.
///
/// Reads outside a transaction see committed state only.
pub trait InvoiceStore: Send + Sync {
    type Tx<'a>: InvoiceTx
    where
        Self: 'a;

    /// Open a transaction. Dropping it without [`InvoiceTx::commit`] discards
    /// every staged change.
    fn begin(&self) -> Result<Self::Tx<'_>, StoreError>;

    fn get(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;

    /// Invoices of one vendor in id order.
    fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Invoice>, StoreError>;
}

/// An open unit of work. Doubles as the admission lookup so checks run
/// against the same snapshot the insert lands in.
pub trait InvoiceTx: AdmissionLookup<Error = StoreError> {
    /// Insert in the initial status and assign a surrogate id.
    ///
    /// Fails with [`StoreError::UniqueViolation`] when the vendor already has
    /// an invoice with the same number.
    fn insert(&mut self, new: NewInvoice, created_at: DateTime<Utc>) -> Result<Invoice, StoreError>;

    fn get(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;

    /// Replace the stored row if its version matches `expected`.
    fn update(&mut self, invoice: &Invoice, expected: ExpectedVersion) -> Result<(), StoreError>;

    fn commit(self) -> Result<(), StoreError>;
}
