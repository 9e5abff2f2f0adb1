use serde::{Deserialize, Serialize};

use invoicegate_core::{ActorId, VendorId};

use crate::Role;

/// An authenticated caller, as handed over by the session layer.
///
/// `vendor_id` is the vendor linked to the account; it is only meaningful for
/// [`Role::Vendor`] callers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub actor_id: ActorId,
    pub role: Role,
    pub vendor_id: Option<VendorId>,
}

impl Principal {
    pub fn new(actor_id: ActorId, role: Role) -> Self {
        Self {
            actor_id,
            role,
            vendor_id: None,
        }
    }

    pub fn vendor(actor_id: ActorId, vendor_id: VendorId) -> Self {
        Self {
            actor_id,
            role: Role::Vendor,
            vendor_id: Some(vendor_id),
        }
    }
}
