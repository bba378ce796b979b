// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token extraction and the Axum permission extractor.
//!
//! Use `RequirePermission` in handlers to require a permission:
//!
//! ```rust,ignore
//! async fn create_drink(
//!     RequirePermission { claims, .. }: RequirePermission<PostDrinks>,
//! ) -> impl IntoResponse {
//!     // claims is the verified ClaimSet
//! }
//! ```

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::permissions::RequiredPermission;
use super::{AuthError, ClaimSet};
use crate::state::AppState;

/// Pull the token out of an `Authorization` header value.
///
/// The value must be exactly `<scheme> <token>` separated by one space, with
/// the scheme equal to `bearer` in any case. The token itself is returned
/// verbatim; its structure is checked during verification.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = match header {
        Some(h) if !h.is_empty() => h,
        _ => return Err(AuthError::MissingHeader),
    };

    let mut parts = header.split(' ');
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AuthError::MalformedHeader);
    };
    if scheme.is_empty() || token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::SchemeMismatch);
    }

    Ok(token)
}

/// Extractor that requires the permission `P`.
///
/// Runs the full auth pipeline through the [`AuthGate`](super::AuthGate) in
/// [`AppState`]; the handler only runs when the token grants `P`.
pub struct RequirePermission<P: RequiredPermission> {
    pub claims: ClaimSet,
    _permission: PhantomData<P>,
}

impl<P: RequiredPermission> RequirePermission<P> {
    pub fn into_claims(self) -> ClaimSet {
        self.claims
    }

    /// Build an already-authorized extractor for calling handlers directly.
    #[cfg(test)]
    pub(crate) fn from_claims(claims: ClaimSet) -> Self {
        Self {
            claims,
            _permission: PhantomData,
        }
    }
}

impl<P: RequiredPermission> FromRequestParts<AppState> for RequirePermission<P> {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str().map_err(|_| AuthError::MalformedHeader))
            .transpose()?;

        let claims = state.gate.require(P::NAME).authorize(header).await?;

        Ok(RequirePermission {
            claims,
            _permission: PhantomData,
        })
    }
}
