// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Behaviour
//!
//! - The key set is fetched from `https://{domain}/.well-known/jwks.json`
//! - Every fetch is bounded by the HTTP client timeout
//! - Caching is optional: with a zero TTL every lookup refetches
//! - A refresh replaces the cached set wholesale or leaves it untouched

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::error::AuthError;

/// Upper bound on the JWKS document size (1 MiB).
pub const MAX_JWKS_SIZE: usize = 1 << 20;

/// Public signing keys published by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
    /// Missing `keys` is an empty set; lookups then fail with an unknown key id.
    #[serde(default)]
    pub keys: Vec<SigningKey>,
}

/// A single JWK entry.
///
/// Fields are optional so that one key of an unexpected type does not make
/// the whole document unreadable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    #[serde(default)]
    pub kty: String,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default, rename = "use")]
    pub use_: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
    /// RSA modulus (base64url)
    #[serde(default)]
    pub n: Option<String>,
    /// RSA public exponent (base64url)
    #[serde(default)]
    pub e: Option<String>,
}

impl SigningKey {
    /// Modulus and exponent, if this is a usable RSA key.
    pub fn rsa_components(&self) -> Option<(&str, &str)> {
        if self.kty != "RSA" {
            return None;
        }
        Some((self.n.as_deref()?, self.e.as_deref()?))
    }
}

impl KeySet {
    /// Find the RSA key with the given key id.
    pub fn find_rsa_key(&self, kid: &str) -> Option<&SigningKey> {
        self.keys
            .iter()
            .find(|k| k.kid.as_deref() == Some(kid) && k.rsa_components().is_some())
    }
}

/// A key set together with where it came from.
#[derive(Debug, Clone)]
pub struct KeySnapshot {
    pub key_set: Arc<KeySet>,
    /// `true` when served from cache rather than fetched for this call
    pub cached: bool,
}

/// JWKS cache entry.
struct CacheEntry {
    key_set: Arc<KeySet>,
    fetched_at: Instant,
}

/// Fetches the identity provider's key set, with optional caching.
#[derive(Clone)]
pub struct KeySetFetcher {
    /// JWKS URL
    jwks_url: String,
    /// Cache TTL; zero disables caching
    cache_ttl: Duration,
    /// Cached key set
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// HTTP client
    client: reqwest::Client,
}

impl KeySetFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    ///
    /// # Arguments
    /// - `jwks_url`: The JWKS endpoint URL (e.g., `https://tenant.auth0.com/.well-known/jwks.json`)
    pub fn new(jwks_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            jwks_url: jwks_url.into(),
            cache_ttl: Duration::ZERO,
            cache: Arc::new(RwLock::new(None)),
            client,
        })
    }

    /// Cache fetched key sets for `ttl`.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Return the cached key set if still fresh, otherwise fetch a new one.
    pub async fn current(&self) -> Result<KeySnapshot, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(KeySnapshot {
                        key_set: Arc::clone(&entry.key_set),
                        cached: true,
                    });
                }
            }
        }

        self.refresh().await
    }

    /// Fetch the key set and replace the cache with it.
    ///
    /// On failure the cache keeps its previous contents.
    pub async fn refresh(&self) -> Result<KeySnapshot, AuthError> {
        let key_set = Arc::new(self.fetch().await?);

        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            key_set: Arc::clone(&key_set),
            fetched_at: Instant::now(),
        });

        Ok(KeySnapshot {
            key_set,
            cached: false,
        })
    }

    /// Fetch the key set from the endpoint, bypassing the cache.
    pub async fn fetch(&self) -> Result<KeySet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::KeySetUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeySetUnavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let payload = response
            .bytes()
            .await
            .map_err(|e| AuthError::KeySetUnavailable(e.to_string()))?;
        if payload.len() > MAX_JWKS_SIZE {
            return Err(AuthError::KeySetUnavailable(format!(
                "JWKS payload too large: {} bytes",
                payload.len()
            )));
        }

        let key_set: KeySet = serde_json::from_slice(&payload)
            .map_err(|e| AuthError::KeySetUnavailable(format!("invalid JWKS document: {e}")))?;

        tracing::debug!(
            url = %self.jwks_url,
            keys = key_set.keys.len(),
            "Fetched JWKS"
        );

        Ok(key_set)
    }

    /// Check if a key set is currently cached and fresh.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        if let Some(entry) = &*cache {
            entry.fetched_at.elapsed() < self.cache_ttl
        } else {
            false
        }
    }
}
