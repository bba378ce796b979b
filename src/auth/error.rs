// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication and authorization failure.
///
/// Every step of the auth pipeline fails with exactly one of these kinds,
/// and each kind carries its own HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header present
    MissingHeader,
    /// Header is not `<scheme> <token>`, or the token header segment is unusable
    MalformedHeader,
    /// Scheme word is not `bearer`
    SchemeMismatch,
    /// JWKS could not be fetched or parsed
    KeySetUnavailable(String),
    /// No signing key in the JWKS matches the token's `kid`
    UnknownKeyId,
    /// Signature verification failed
    BadSignature,
    /// Token has expired
    TokenExpired,
    /// Issuer or audience mismatch
    ClaimRejected,
    /// Signed payload could not be parsed as a claim set
    MalformedToken,
    /// Claim set has no usable `permissions` entry
    PermissionsClaimMissing,
    /// Required permission is not granted
    PermissionDenied,
}

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    error: u16,
    message: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "missing_header",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::SchemeMismatch => "scheme_mismatch",
            AuthError::KeySetUnavailable(_) => "key_set_unavailable",
            AuthError::UnknownKeyId => "unknown_key_id",
            AuthError::BadSignature => "bad_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::ClaimRejected => "claim_rejected",
            AuthError::MalformedToken => "malformed_token",
            AuthError::PermissionsClaimMissing => "permissions_claim_missing",
            AuthError::PermissionDenied => "permission_denied",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingHeader
            | AuthError::MalformedHeader
            | AuthError::SchemeMismatch
            | AuthError::KeySetUnavailable(_)
            | AuthError::UnknownKeyId
            | AuthError::BadSignature
            | AuthError::TokenExpired
            | AuthError::ClaimRejected => StatusCode::UNAUTHORIZED,
            AuthError::MalformedToken | AuthError::PermissionsClaimMissing => {
                StatusCode::BAD_REQUEST
            }
            AuthError::PermissionDenied => StatusCode::FORBIDDEN,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingHeader => write!(f, "Authorization header is required"),
            AuthError::MalformedHeader => {
                write!(f, "Authorization is malformed (expected 'Bearer <token>' with a key id)")
            }
            AuthError::SchemeMismatch => write!(f, "Authorization header must start with 'Bearer'"),
            AuthError::KeySetUnavailable(msg) => write!(f, "Failed to fetch signing keys: {msg}"),
            AuthError::UnknownKeyId => write!(f, "Unable to find the appropriate signing key"),
            AuthError::BadSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::ClaimRejected => {
                write!(f, "Incorrect claims, please check the audience and issuer")
            }
            AuthError::MalformedToken => write!(f, "Unable to parse authentication token"),
            AuthError::PermissionsClaimMissing => write!(f, "Permissions not included in token"),
            AuthError::PermissionDenied => {
                write!(f, "Insufficient permissions for this operation")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            success: false,
            error: status.as_u16(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}
