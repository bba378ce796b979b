// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission gate composing extraction, verification and authorization.
//!
//! ```rust,ignore
//! let guard = gate.require("delete:drinks");
//! let deleted = guard
//!     .call(authorization_header, |claims| async move { delete(claims, id).await })
//!     .await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use super::extractor::extract_bearer_token;
use super::permissions::check_permission;
use super::{AuthError, ClaimSet, TokenVerifier};

/// Shared entry point to the auth pipeline.
///
/// Cheap to clone; the only state shared between requests is the verifier's
/// key set cache.
#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<TokenVerifier>,
}

impl AuthGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// A guard for one protected operation.
    pub fn require(&self, permission: &'static str) -> Guard {
        Guard {
            gate: self.clone(),
            permission,
        }
    }
}

/// Gate instance bound to a single required permission.
#[derive(Clone)]
pub struct Guard {
    gate: AuthGate,
    permission: &'static str,
}

impl Guard {
    pub fn permission(&self) -> &'static str {
        self.permission
    }

    /// Run extract, verify and check for one request's `Authorization` header.
    pub async fn authorize(&self, authorization: Option<&str>) -> Result<ClaimSet, AuthError> {
        let result = self.run_pipeline(authorization).await;

        if let Err(ref e) = result {
            match e {
                AuthError::KeySetUnavailable(reason) => tracing::warn!(
                    permission = self.permission,
                    reason = %reason,
                    "Rejected request: signing keys unavailable"
                ),
                _ => tracing::debug!(
                    permission = self.permission,
                    error_code = e.error_code(),
                    "Rejected request"
                ),
            }
        }

        result
    }

    /// Authorize, then invoke `op` with the decoded claims.
    ///
    /// `op` is not called when authorization fails; its output is returned
    /// unchanged otherwise.
    pub async fn call<F, Fut, T>(&self, authorization: Option<&str>, op: F) -> Result<T, AuthError>
    where
        F: FnOnce(ClaimSet) -> Fut,
        Fut: Future<Output = T>,
    {
        let claims = self.authorize(authorization).await?;
        Ok(op(claims).await)
    }

    async fn run_pipeline(&self, authorization: Option<&str>) -> Result<ClaimSet, AuthError> {
        let token = extract_bearer_token(authorization)?;
        let claims = self.gate.verifier.verify(token).await?;
        check_permission(self.permission, &claims)?;
        Ok(claims)
    }
}
