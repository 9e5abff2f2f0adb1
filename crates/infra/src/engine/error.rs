use thiserror::Error;

use invoicegate_audit::AuditError;
use invoicegate_auth::AuthzError;
use invoicegate_core::InvoiceId;
use invoicegate_invoicing::{AdmissionRejection, SubmissionError, WorkflowError};

use crate::invoice_store::StoreError;

/// Everything an engine operation can fail with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    #[error(transparent)]
    InvalidSubmission(#[from] SubmissionError),

    /// An admission rule refused the candidate.
    #[error(transparent)]
    Rejected(#[from] AdmissionRejection),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Invoice not found")]
    NotFound(InvoiceId),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}

impl EngineError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Unauthorized(e) => e.code(),
            EngineError::InvalidSubmission(e) => e.code(),
            EngineError::Rejected(r) => r.code(),
            EngineError::Workflow(e) => e.code(),
            EngineError::NotFound(_) => "not_found",
            EngineError::Store(e) => e.code(),
            EngineError::Audit(_) => "audit_unavailable",
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, EngineError::Rejected(_))
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            // The uniqueness constraint is the last line of the duplicate-number rule.
            StoreError::UniqueViolation { invoice_no, .. } => {
                EngineError::Rejected(AdmissionRejection::DuplicateNumber { invoice_no })
            }
            StoreError::NotFound(id) => EngineError::NotFound(id),
            other => EngineError::Store(other),
        }
    }
}
