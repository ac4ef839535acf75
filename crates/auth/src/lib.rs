//! `supplychain-auth` — administrator authority.
//!
//! Owns the identity → administrator-flag store and exposes the read-only
//! [`AdminAuthority`] query that other registries authorize against. Every
//! mutation of the store is itself gated on the caller being an administrator.

pub mod admin;
pub mod authorize;

pub use admin::{AdminEvent, AdminGranted, AdminRegistry, AdminRevoked};
pub use authorize::{AdminAuthority, AuthzError, authorize_admin};
