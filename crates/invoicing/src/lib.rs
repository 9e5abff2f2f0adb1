//! Invoice admission and lifecycle domain.
//!
//! This crate contains the business rules for vendor invoices, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage):
//!
//! - [`admission`]: hard-block rules deciding whether a candidate may enter
//! - [`financials`]: derived tax/total figures
//! - [`workflow`]: the status state machine
//! - [`submission`]: normalization of raw submission payloads

pub mod admission;
pub mod financials;
pub mod fingerprint;
pub mod invoice;
pub mod submission;
pub mod workflow;

pub use admission::{
    Admission, AdmissionCandidate, AdmissionLookup, AdmissionPolicy, AdmissionRejection,
    AdmissionValidator, ExistingInvoice,
};
pub use financials::{
    derive_tax, derive_total, summarize, FinancialRecord, MonetarySummary, PortfolioTotals,
};
pub use fingerprint::{ContentFingerprint, FingerprintError};
pub use invoice::{
    DocumentType, Invoice, InvoiceEvent, InvoiceRecategorised, InvoiceStatus, InvoiceTransitioned,
    NewInvoice, PaymentDetails, TaxComponents,
};
pub use submission::{SubmissionError, SubmissionPayload};
pub use workflow::{
    LifecycleCommand, TransitionCommand, TransitionInput, TransitionPolicy, TransitionTable,
    Workflow, WorkflowAction, WorkflowError,
};
