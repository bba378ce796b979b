// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Drink Menu Server - permission-gated drink menu API
//!
//! Anyone can read the short menu. Recipes and menu edits require an RS256
//! access token from the configured Auth0 tenant, verified against its JWKS
//! and carrying the permission the endpoint asks for.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers, router and OpenAPI document (Axum)
//! - `auth` - Bearer extraction, JWKS fetching, token verification, permissions
//! - `config` - Environment-driven settings
//! - `store` - In-memory drink catalogue

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_support;
