use std::sync::Arc;

use thiserror::Error;

use supplychain_core::{DomainError, Identity};

/// Read-only administrator query.
///
/// This is the only surface a dependent registry sees of the admin store: it
/// can ask, never mutate.
pub trait AdminAuthority: Send + Sync {
    /// Whether `identity` currently holds the administrator flag.
    ///
    /// Pure read; never fails.
    fn is_admin(&self, identity: &Identity) -> bool;
}

impl<T> AdminAuthority for Arc<T>
where
    T: AdminAuthority + ?Sized,
{
    fn is_admin(&self, identity: &Identity) -> bool {
        (**self).is_admin(identity)
    }
}

impl<T> AdminAuthority for &T
where
    T: AdminAuthority + ?Sized,
{
    fn is_admin(&self, identity: &Identity) -> bool {
        (**self).is_admin(identity)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: {0} is not an administrator")]
    NotAdmin(Identity),
}

impl From<AuthzError> for DomainError {
    fn from(_: AuthzError) -> Self {
        DomainError::Unauthorized
    }
}

/// Require `caller` to be an administrator according to `authority`.
///
/// - No IO
/// - No panics
pub fn authorize_admin<A>(authority: &A, caller: &Identity) -> Result<(), AuthzError>
where
    A: AdminAuthority + ?Sized,
{
    if authority.is_admin(caller) {
        Ok(())
    } else {
        Err(AuthzError::NotAdmin(*caller))
    }
}
