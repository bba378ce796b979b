// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT verification against the identity provider's JWKS.
//!
//! Verification runs in a fixed order and stops at the first failure:
//!
//! 1. Decode the header without verifying and read its `kid`
//! 2. Obtain the key set (cached or freshly fetched)
//! 3. Find the RSA key with that `kid`
//! 4. Verify the signature with one of the allowed algorithms
//! 5. Validate `exp`, `iss` and `aud` with no clock-skew leeway

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

use super::jwks::{KeySet, KeySetFetcher, SigningKey};
use super::{AuthError, ClaimSet};
use crate::config::AuthConfig;

/// Claims every accepted token must carry.
const REQUIRED_CLAIMS: [&str; 3] = ["exp", "iss", "aud"];

/// Verifies bearer tokens and decodes their claims.
pub struct TokenVerifier {
    fetcher: KeySetFetcher,
    issuer: String,
    audience: String,
    algorithms: Vec<Algorithm>,
    refetch_on_unknown_kid: bool,
}

impl TokenVerifier {
    pub fn new(
        fetcher: KeySetFetcher,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        algorithms: Vec<Algorithm>,
    ) -> Self {
        Self {
            fetcher,
            issuer: issuer.into(),
            audience: audience.into(),
            algorithms,
            refetch_on_unknown_kid: true,
        }
    }

    /// Build a verifier and its fetcher from configuration.
    pub fn from_config(config: &AuthConfig) -> Result<Self, reqwest::Error> {
        let fetcher = KeySetFetcher::new(&config.jwks_url, config.jwks_timeout)?
            .with_cache_ttl(config.jwks_cache_ttl);

        Ok(Self::new(
            fetcher,
            &config.issuer,
            &config.audience,
            config.algorithms.clone(),
        )
        .with_refetch_on_unknown_kid(config.refetch_on_unknown_kid))
    }

    /// Whether a cached key set is refreshed once when the token's `kid` is unknown.
    pub fn with_refetch_on_unknown_kid(mut self, enabled: bool) -> Self {
        self.refetch_on_unknown_kid = enabled;
        self
    }

    pub fn fetcher(&self) -> &KeySetFetcher {
        &self.fetcher
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Verify `token` and return its claims.
    pub async fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        let kid = unverified_kid(token)?;

        let mut snapshot = self.fetcher.current().await?;
        if snapshot.cached
            && self.refetch_on_unknown_kid
            && snapshot.key_set.find_rsa_key(&kid).is_none()
        {
            tracing::debug!(kid = %kid, "Unknown key id in cached JWKS, refetching once");
            snapshot = self.fetcher.refresh().await?;
        }

        let key = snapshot
            .key_set
            .find_rsa_key(&kid)
            .ok_or(AuthError::UnknownKeyId)?;
        self.decode_with_key(token, key)
    }

    /// Verify `token` against an already fetched key set.
    pub fn verify_with_key_set(
        &self,
        token: &str,
        key_set: &KeySet,
    ) -> Result<ClaimSet, AuthError> {
        let kid = unverified_kid(token)?;
        let key = key_set.find_rsa_key(&kid).ok_or(AuthError::UnknownKeyId)?;
        self.decode_with_key(token, key)
    }

    fn decode_with_key(&self, token: &str, key: &SigningKey) -> Result<ClaimSet, AuthError> {
        let (n, e) = key.rsa_components().ok_or(AuthError::UnknownKeyId)?;
        let decoding_key =
            DecodingKey::from_rsa_components(n, e).map_err(|_| AuthError::BadSignature)?;

        let token_data = decode::<ClaimSet>(token, &decoding_key, &self.validation())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::ImmatureSignature => AuthError::ClaimRejected,
                // Only reachable once the signature has checked out.
                ErrorKind::Json(_) | ErrorKind::Utf8(_) => AuthError::MalformedToken,
                // Anything else means the signature could not be verified.
                _ => AuthError::BadSignature,
            })?;

        Ok(token_data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = self.algorithms.clone();
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&REQUIRED_CLAIMS);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation
    }
}

/// Read the `kid` from the token header without verifying anything.
fn unverified_kid(token: &str) -> Result<String, AuthError> {
    decode_header(token)
        .map_err(|_| AuthError::MalformedHeader)?
        .kid
        .ok_or(AuthError::MalformedHeader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use serde_json::json;

    use crate::test_support::{
        self, mint, mint_with_foreign_key, now, valid_claims, JwksServer, AUDIENCE, ISSUER,
        KEY_ID,
    };

    fn offline_verifier() -> TokenVerifier {
        let fetcher = KeySetFetcher::new("http://127.0.0.1:9/jwks.json", Duration::from_secs(1))
            .unwrap();
        TokenVerifier::new(fetcher, ISSUER, AUDIENCE, vec![Algorithm::RS256])
    }

    #[test]
    fn valid_token_round_trips_claims() {
        let claims = valid_claims(&["get:drinks-detail"]);
        let token = mint(&claims, Some(KEY_ID));

        let decoded = offline_verifier()
            .verify_with_key_set(&token, &test_support::key_set())
            .unwrap();

        assert_eq!(serde_json::to_value(&decoded).unwrap(), claims);
    }

    #[test]
    fn repeated_verification_is_identical() {
        let token = mint(&valid_claims(&["post:drinks"]), Some(KEY_ID));
        let verifier = offline_verifier();
        let key_set = test_support::key_set();

        let first = verifier.verify_with_key_set(&token, &key_set).unwrap();
        let second = verifier.verify_with_key_set(&token, &key_set).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn garbage_token_is_malformed_header() {
        let verifier = offline_verifier();
        let key_set = test_support::key_set();
        for token in ["", "abc", "a.b", "!!.??.##"] {
            assert_eq!(
                verifier.verify_with_key_set(token, &key_set),
                Err(AuthError::MalformedHeader),
                "{token:?}"
            );
        }
    }

    #[test]
    fn token_without_kid_is_malformed_header() {
        let token = mint(&valid_claims(&[]), None);
        assert_eq!(
            offline_verifier().verify_with_key_set(&token, &test_support::key_set()),
            Err(AuthError::MalformedHeader)
        );
    }

    #[test]
    fn unknown_kid_is_rejected() {
        let token = mint(&valid_claims(&[]), Some("rotated-away"));
        assert_eq!(
            offline_verifier().verify_with_key_set(&token, &test_support::key_set()),
            Err(AuthError::UnknownKeyId)
        );
    }

    #[test]
    fn unknown_kid_in_empty_key_set() {
        let token = mint(&valid_claims(&[]), Some(KEY_ID));
        assert_eq!(
            offline_verifier().verify_with_key_set(&token, &KeySet::default()),
            Err(AuthError::UnknownKeyId)
        );
    }

    #[test]
    fn foreign_key_signature_is_rejected() {
        let token = mint_with_foreign_key(&valid_claims(&[]), KEY_ID);
        assert_eq!(
            offline_verifier().verify_with_key_set(&token, &test_support::key_set()),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = mint(&valid_claims(&["get:drinks"]), Some(KEY_ID));
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let forged = valid_claims(&["get:drinks", "delete:drinks"]);
        parts[1] = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let tampered = parts.join(".");

        assert_eq!(
            offline_verifier().verify_with_key_set(&tampered, &test_support::key_set()),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn garbled_signature_is_bad_signature() {
        let token = mint(&valid_claims(&["get:drinks"]), Some(KEY_ID));
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[2] = "!!!not-base64!!!";
        let garbled = parts.join(".");

        let err = offline_verifier()
            .verify_with_key_set(&garbled, &test_support::key_set())
            .unwrap_err();
        assert_eq!(err, AuthError::BadSignature);
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn disallowed_algorithm_is_rejected() {
        let fetcher = KeySetFetcher::new("http://127.0.0.1:9/jwks.json", Duration::from_secs(1))
            .unwrap();
        let verifier = TokenVerifier::new(fetcher, ISSUER, AUDIENCE, vec![Algorithm::RS512]);
        let token = mint(&valid_claims(&[]), Some(KEY_ID));

        assert_eq!(
            verifier.verify_with_key_set(&token, &test_support::key_set()),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn expired_by_one_second_is_rejected() {
        let mut claims = valid_claims(&[]);
        claims["exp"] = json!(now() - 1);
        let token = mint(&claims, Some(KEY_ID));

        assert_eq!(
            offline_verifier().verify_with_key_set(&token, &test_support::key_set()),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn expiring_in_one_second_is_accepted() {
        let mut claims = valid_claims(&[]);
        claims["exp"] = json!(now() + 1);
        let token = mint(&claims, Some(KEY_ID));

        assert!(offline_verifier()
            .verify_with_key_set(&token, &test_support::key_set())
            .is_ok());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let mut claims = valid_claims(&[]);
        claims["iss"] = json!("https://evil.example.com/");
        let token = mint(&claims, Some(KEY_ID));

        assert_eq!(
            offline_verifier().verify_with_key_set(&token, &test_support::key_set()),
            Err(AuthError::ClaimRejected)
        );
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let mut claims = valid_claims(&[]);
        claims["aud"] = json!(["other-api"]);
        let token = mint(&claims, Some(KEY_ID));

        assert_eq!(
            offline_verifier().verify_with_key_set(&token, &test_support::key_set()),
            Err(AuthError::ClaimRejected)
        );
    }

    #[test]
    fn audience_list_containing_expected_is_accepted() {
        let mut claims = valid_claims(&[]);
        claims["aud"] = json!(["other-api", AUDIENCE]);
        let token = mint(&claims, Some(KEY_ID));

        assert!(offline_verifier()
            .verify_with_key_set(&token, &test_support::key_set())
            .is_ok());
    }

    #[test]
    fn missing_audience_is_rejected() {
        let mut claims = valid_claims(&[]);
        claims.as_object_mut().unwrap().remove("aud");
        let token = mint(&claims, Some(KEY_ID));

        assert_eq!(
            offline_verifier().verify_with_key_set(&token, &test_support::key_set()),
            Err(AuthError::ClaimRejected)
        );
    }

    #[tokio::test]
    async fn verify_fetches_key_set() {
        let server = JwksServer::start(test_support::jwks_document()).await;
        let verifier = test_support::verifier(&server);
        let claims = valid_claims(&["patch:drinks"]);
        let token = mint(&claims, Some(KEY_ID));

        let decoded = verifier.verify(&token).await.unwrap();
        assert_eq!(serde_json::to_value(&decoded).unwrap(), claims);
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn verify_surfaces_fetch_failure() {
        let fetcher = KeySetFetcher::new("http://127.0.0.1:9/jwks.json", Duration::from_secs(1))
            .unwrap();
        let verifier = TokenVerifier::new(fetcher, ISSUER, AUDIENCE, vec![Algorithm::RS256]);
        let token = mint(&valid_claims(&[]), Some(KEY_ID));

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::KeySetUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn malformed_header_short_circuits_before_fetch() {
        let server = JwksServer::start(test_support::jwks_document()).await;
        let verifier = test_support::verifier(&server);

        assert_eq!(
            verifier.verify("not-a-token").await,
            Err(AuthError::MalformedHeader)
        );
        assert_eq!(server.hits(), 0);
    }

    #[tokio::test]
    async fn unknown_kid_refetches_cached_set_once() {
        let server = JwksServer::start(json!({ "keys": [] })).await;
        let fetcher = KeySetFetcher::new(server.url(), Duration::from_secs(5))
            .unwrap()
            .with_cache_ttl(Duration::from_secs(300));
        let verifier = TokenVerifier::new(fetcher, ISSUER, AUDIENCE, vec![Algorithm::RS256]);
        let token = mint(&valid_claims(&[]), Some(KEY_ID));

        // Prime the cache with a set that lacks the key, then rotate it in.
        assert_eq!(verifier.verify(&token).await, Err(AuthError::UnknownKeyId));
        assert_eq!(server.hits(), 1);
        server.set_document(test_support::jwks_document());

        assert!(verifier.verify(&token).await.is_ok());
        assert_eq!(server.hits(), 2);
    }

    #[tokio::test]
    async fn unknown_kid_without_refetch_policy_stays_unknown() {
        let server = JwksServer::start(json!({ "keys": [] })).await;
        let fetcher = KeySetFetcher::new(server.url(), Duration::from_secs(5))
            .unwrap()
            .with_cache_ttl(Duration::from_secs(300));
        let verifier = TokenVerifier::new(fetcher, ISSUER, AUDIENCE, vec![Algorithm::RS256])
            .with_refetch_on_unknown_kid(false);
        let token = mint(&valid_claims(&[]), Some(KEY_ID));

        assert_eq!(verifier.verify(&token).await, Err(AuthError::UnknownKeyId));
        server.set_document(test_support::jwks_document());
        assert_eq!(verifier.verify(&token).await, Err(AuthError::UnknownKeyId));
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn persistent_unknown_kid_refetches_only_once_per_request() {
        let server = JwksServer::start(test_support::jwks_document()).await;
        let fetcher = KeySetFetcher::new(server.url(), Duration::from_secs(5))
            .unwrap()
            .with_cache_ttl(Duration::from_secs(300));
        let verifier = TokenVerifier::new(fetcher, ISSUER, AUDIENCE, vec![Algorithm::RS256]);
        let good = mint(&valid_claims(&[]), Some(KEY_ID));
        let stray = mint(&valid_claims(&[]), Some("never-published"));

        assert!(verifier.verify(&good).await.is_ok());
        assert_eq!(verifier.verify(&stray).await, Err(AuthError::UnknownKeyId));
        assert_eq!(server.hits(), 2);
    }
}
