use serde::{Deserialize, Serialize};

/// Fixed vocabulary of audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Upload,
    InvoiceUpload,
    Approve,
    Reject,
    Review,
    Clarify,
    Hold,
    Override,
    Pay,
    PaymentProcessed,
    Cancel,
    Update,
    ReportExport,
    VendorCreate,
    VendorUpdate,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Upload => "UPLOAD",
            AuditAction::InvoiceUpload => "INVOICE_UPLOAD",
            AuditAction::Approve => "APPROVE",
            AuditAction::Reject => "REJECT",
            AuditAction::Review => "REVIEW",
            AuditAction::Clarify => "CLARIFY",
            AuditAction::Hold => "HOLD",
            AuditAction::Override => "OVERRIDE",
            AuditAction::Pay => "PAY",
            AuditAction::PaymentProcessed => "PAYMENT_PROCESSED",
            AuditAction::Cancel => "CANCEL",
            AuditAction::Update => "UPDATE",
            AuditAction::ReportExport => "REPORT_EXPORT",
            AuditAction::VendorCreate => "VENDOR_CREATE",
            AuditAction::VendorUpdate => "VENDOR_UPDATE",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
