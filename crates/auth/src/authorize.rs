use thiserror::Error;

use invoicegate_core::VendorId;

use crate::{Capability, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing capability '{0}'")]
    Forbidden(Capability),

    #[error("Please select a vendor from the dropdown")]
    VendorNotSelected,

    #[error("No vendor linked to your account")]
    VendorNotLinked,

    #[error("access denied to invoices of vendor {0}")]
    ForeignVendor(VendorId),

    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

impl AuthzError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthzError::Forbidden(_) | AuthzError::ForeignVendor(_) => "forbidden",
            AuthzError::VendorNotSelected | AuthzError::VendorNotLinked => "vendor_unresolved",
            AuthzError::UnknownRole(_) => "unknown_role",
        }
    }
}

/// Check that a principal holds a capability.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: Capability) -> Result<(), AuthzError> {
    if principal.role.grants(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required))
    }
}

/// Decide which vendor a submission is filed under.
///
/// Back-office callers must name the vendor explicitly. Vendor callers always
/// submit for their linked vendor; a vendor id they pass is ignored.
pub fn resolve_submission_vendor(
    principal: &Principal,
    requested: Option<VendorId>,
) -> Result<VendorId, AuthzError> {
    if principal.role.grants(Capability::SubmitOnBehalf) {
        return requested.ok_or(AuthzError::VendorNotSelected);
    }

    authorize(principal, Capability::SubmitOwnInvoice)?;
    principal.vendor_id.ok_or(AuthzError::VendorNotLinked)
}

/// Read access to an invoice owned by `owner`.
pub fn ensure_can_view(principal: &Principal, owner: VendorId) -> Result<(), AuthzError> {
    if principal.role.grants(Capability::ViewAllInvoices) || principal.vendor_id == Some(owner) {
        Ok(())
    } else {
        Err(AuthzError::ForeignVendor(owner))
    }
}
