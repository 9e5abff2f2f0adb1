//! `invoicegate-auth`: caller identity and capability checks.
//!
//! The session/token mechanism lives outside this workspace; callers arrive
//! here as an already-authenticated [`Principal`]. Role-to-capability mapping
//! is decided once, in this crate, instead of being re-derived at each rule.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{authorize, ensure_can_view, resolve_submission_vendor, AuthzError};
pub use permissions::Capability;
pub use principal::Principal;
pub use roles::Role;
