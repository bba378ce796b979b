// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decoded JWT claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error returned by the typed claim accessors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    #[error("claim `{0}` is missing")]
    Missing(&'static str),
    #[error("claim `{0}` has an unexpected shape")]
    WrongShape(&'static str),
}

/// Claims decoded from a verified access token.
///
/// Auth0 access tokens carry the standard registered claims plus a
/// `permissions` array when RBAC is enabled for the API. The payload is kept
/// as-is so handlers can read any claim, while the accessors below give typed
/// access to the claims the auth layer relies on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    /// Wrap an already decoded payload.
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    /// Raw claim lookup.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Issuer (`iss`).
    pub fn issuer(&self) -> Result<&str, ClaimError> {
        self.required_str("iss")
    }

    /// Subject (`sub`), the identity provider's user id.
    pub fn subject(&self) -> Result<&str, ClaimError> {
        self.required_str("sub")
    }

    /// Audience (`aud`), which may be a single string or an array.
    pub fn audiences(&self) -> Result<Vec<&str>, ClaimError> {
        match self.0.get("aud") {
            None => Err(ClaimError::Missing("aud")),
            Some(Value::String(aud)) => Ok(vec![aud.as_str()]),
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| v.as_str().ok_or(ClaimError::WrongShape("aud")))
                .collect(),
            Some(_) => Err(ClaimError::WrongShape("aud")),
        }
    }

    /// Expiration (`exp`) as a UTC timestamp.
    pub fn expires_at(&self) -> Result<DateTime<Utc>, ClaimError> {
        let exp = self
            .0
            .get("exp")
            .ok_or(ClaimError::Missing("exp"))?
            .as_i64()
            .ok_or(ClaimError::WrongShape("exp"))?;
        DateTime::from_timestamp(exp, 0).ok_or(ClaimError::WrongShape("exp"))
    }

    /// Granted permissions (`permissions`).
    ///
    /// Non-string members are skipped; they can never match a permission.
    pub fn permissions(&self) -> Result<Vec<&str>, ClaimError> {
        match self.0.get("permissions") {
            None => Err(ClaimError::Missing("permissions")),
            Some(Value::Array(values)) => Ok(values.iter().filter_map(Value::as_str).collect()),
            Some(_) => Err(ClaimError::WrongShape("permissions")),
        }
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    fn required_str(&self, name: &'static str) -> Result<&str, ClaimError> {
        self.0
            .get(name)
            .ok_or(ClaimError::Missing(name))?
            .as_str()
            .ok_or(ClaimError::WrongShape(name))
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(claims: Map<String, Value>) -> Self {
        Self(claims)
    }
}
