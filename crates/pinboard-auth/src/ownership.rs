//! Resource-ownership authorization

use crate::error::AuthError;

/// Allow a mutation only when the principal owns the resource
///
/// Pure comparison; callers must confirm the resource exists first so a
/// missing resource surfaces as not-found rather than forbidden. Reads are
/// not owner-scoped and never go through this check.
pub fn ensure_owner(principal_id: i64, owner_id: i64) -> Result<(), AuthError> {
    if principal_id == owner_id {
        Ok(())
    } else {
        Err(AuthError::NotResourceOwner)
    }
}
