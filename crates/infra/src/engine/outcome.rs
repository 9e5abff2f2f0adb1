use serde::{Deserialize, Serialize};

use invoicegate_core::{Entity, InvoiceId};
use invoicegate_invoicing::Invoice;

use super::error::EngineError;
use super::SubmissionReceipt;

/// Uniform result shape handed to the outbound boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<InvoiceId>,
}

impl Outcome {
    pub fn ok(code: &str, message: impl Into<String>, invoice_id: Option<InvoiceId>) -> Self {
        Self {
            success: true,
            code: code.to_string(),
            message: message.into(),
            invoice_id,
        }
    }

    pub fn failed(err: &EngineError, invoice_id: Option<InvoiceId>) -> Self {
        let invoice_id = match err {
            EngineError::NotFound(id) => Some(*id),
            _ => invoice_id,
        };
        Self {
            success: false,
            code: err.code().to_string(),
            message: err.to_string(),
            invoice_id,
        }
    }

    pub fn submitted(receipt: &SubmissionReceipt) -> Self {
        Self::ok("submitted", "Invoice uploaded successfully", Some(receipt.invoice_id))
    }

    pub fn transitioned(invoice: &Invoice) -> Self {
        Self::ok(
            "transitioned",
            format!("Invoice {} is now {}", invoice.invoice_no(), invoice.status()),
            Some(invoice.id()),
        )
    }

    pub fn recategorised(invoice: &Invoice) -> Self {
        Self::ok(
            "recategorised",
            format!("Category updated to {}", invoice.category()),
            Some(invoice.id()),
        )
    }

    /// Fold an engine result into an outcome, describing success with `on_ok`.
    pub fn from_result<T>(result: &Result<T, EngineError>, on_ok: impl FnOnce(&T) -> Outcome) -> Self {
        match result {
            Ok(value) => on_ok(value),
            Err(err) => Self::failed(err, None),
        }
    }
}
