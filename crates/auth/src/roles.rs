use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::authorize::AuthzError;
use crate::permissions::Capability;

/// Closed set of roles known to the portal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Admin,
    Finance,
    Vendor,
}

const PRIVILEGED: &[Capability] = &[
    Capability::SubmitOnBehalf,
    Capability::ManageLifecycle,
    Capability::RecordPayment,
    Capability::ViewAllInvoices,
    Capability::EditInvoiceMetadata,
    Capability::ViewAuditTrail,
];

const VENDOR: &[Capability] = &[Capability::SubmitOwnInvoice];

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::Finance => "finance",
            Role::Vendor => "vendor",
        }
    }

    /// Capabilities granted by this role.
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Superadmin | Role::Admin | Role::Finance => PRIVILEGED,
            Role::Vendor => VENDOR,
        }
    }

    pub fn grants(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "superadmin" => Ok(Role::Superadmin),
            "admin" => Ok(Role::Admin),
            "finance" => Ok(Role::Finance),
            "vendor" => Ok(Role::Vendor),
            other => Err(AuthzError::UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_office_roles_share_one_capability_set() {
        for role in [Role::Superadmin, Role::Admin, Role::Finance] {
            assert!(role.grants(Capability::ManageLifecycle));
            assert!(role.grants(Capability::RecordPayment));
            assert!(!role.grants(Capability::SubmitOwnInvoice));
        }
    }

    #[test]
    fn vendor_only_submits_own_invoices() {
        assert_eq!(Role::Vendor.capabilities(), &[Capability::SubmitOwnInvoice]);
        assert!(!Role::Vendor.grants(Capability::ViewAllInvoices));
    }

    #[test]
    fn parses_case_insensitively_and_rejects_unknown() {
        assert_eq!("Finance".parse::<Role>().unwrap(), Role::Finance);
        assert_eq!(
            "auditor".parse::<Role>().unwrap_err(),
            AuthzError::UnknownRole("auditor".to_string())
        );
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Superadmin).unwrap(), "\"superadmin\"");
    }
}
