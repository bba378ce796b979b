// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permissions for authorization.
//!
//! Permissions are plain strings granted by the identity provider through the
//! `permissions` claim (Auth0 RBAC). There is no registry: a request is
//! allowed when the required string is an exact member of that claim.

use super::{AuthError, ClaimSet};

/// A permission that a handler requires, known at compile time.
///
/// Implemented by zero-sized marker types so each protected handler carries
/// its own gate, e.g. `RequirePermission<PostDrinks>`.
pub trait RequiredPermission: Send + Sync + 'static {
    const NAME: &'static str;
}

macro_rules! permission {
    ($(#[$meta:meta])* $ty:ident => $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $ty;

        impl RequiredPermission for $ty {
            const NAME: &'static str = $name;
        }
    };
}

permission!(
    /// Read the full recipe of every drink.
    GetDrinksDetail => "get:drinks-detail"
);
permission!(
    /// Create a new drink.
    PostDrinks => "post:drinks"
);
permission!(
    /// Update an existing drink.
    PatchDrinks => "patch:drinks"
);
permission!(
    /// Delete a drink.
    DeleteDrinks => "delete:drinks"
);

/// Check that `claims` grant `required`.
pub fn check_permission(required: &str, claims: &ClaimSet) -> Result<(), AuthError> {
    let granted = claims
        .permissions()
        .map_err(|_| AuthError::PermissionsClaimMissing)?;

    if granted.contains(&required) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied)
    }
}
