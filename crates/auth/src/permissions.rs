use serde::{Deserialize, Serialize};

/// Capability identifier.
///
/// Capabilities name what a caller may do; roles are mapped onto a fixed set
/// of capabilities in [`crate::Role::capabilities`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Submit invoices for the caller's own linked vendor.
    SubmitOwnInvoice,
    /// Submit invoices on behalf of a named vendor.
    SubmitOnBehalf,
    /// Drive review/approve/reject/clarify/hold transitions.
    ManageLifecycle,
    /// Mark invoices as paid.
    RecordPayment,
    /// Read invoices of every vendor.
    ViewAllInvoices,
    /// Edit non-financial invoice metadata (category).
    EditInvoiceMetadata,
    ViewAuditTrail,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::SubmitOwnInvoice => "invoice.submit_own",
            Capability::SubmitOnBehalf => "invoice.submit_on_behalf",
            Capability::ManageLifecycle => "invoice.lifecycle",
            Capability::RecordPayment => "invoice.pay",
            Capability::ViewAllInvoices => "invoice.view_all",
            Capability::EditInvoiceMetadata => "invoice.edit_metadata",
            Capability::ViewAuditTrail => "audit.read",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
