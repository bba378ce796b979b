// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! This module provides Auth0 JWT authentication and permission checks for
//! the drink menu API.
//!
//! ## Auth Flow
//!
//! 1. Frontend authenticates the user with Auth0
//! 2. Frontend sends `Authorization: Bearer <access token>`
//! 3. Server:
//!    - Reads the token's `kid` from its unverified header
//!    - Fetches the Auth0 JWKS via HTTPS and finds the matching RSA key
//!    - Verifies signature, expiry, issuer, audience
//!    - Checks the endpoint's permission against the `permissions` claim
//!
//! ## Security
//!
//! - All drink mutations and the detailed listing require a permission
//! - JWKS fetches are bounded by a short timeout
//! - JWKS caching is opt-in; a cached set is refetched once on an unknown `kid`
//! - No clock skew tolerance on `exp`

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod jwks;
pub mod permissions;
pub mod verifier;

pub use claims::{ClaimError, ClaimSet};
pub use error::AuthError;
pub use extractor::{extract_bearer_token, RequirePermission};
pub use gate::{AuthGate, Guard};
pub use jwks::{KeySet, KeySetFetcher, KeySnapshot, SigningKey};
pub use permissions::{
    check_permission, DeleteDrinks, GetDrinksDetail, PatchDrinks, PostDrinks, RequiredPermission,
};
pub use verifier::TokenVerifier;
