// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for verified claims and Basic credentials.
//!
//! Use the `Auth` extractor in handlers mounted behind a [`Guard`]:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(claims): Auth) -> impl IntoResponse {
//!     // claims.subject is the caller's user ID
//! }
//! ```
//!
//! [`Guard`]: super::Guard

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use base64::{engine::general_purpose::STANDARD, Engine};

use super::{AuthError, Claims};

/// Claims verified by the auth middleware.
///
/// Rejects with `Unauthorized` when the route is not behind a guard.
pub struct Auth(pub Claims);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Auth)
            .ok_or(AuthError::Unauthorized)
    }
}

/// HTTP Basic credentials (`Authorization: Basic base64(principal:secret)`).
///
/// Used by the token endpoint instead of a bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub principal: String,
    pub secret: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("principal", &self.principal)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl BasicCredentials {
    /// Parse an `Authorization` header value.
    pub fn parse(header: &str) -> Result<Self, AuthError> {
        let (scheme, encoded) = header
            .split_once(' ')
            .ok_or(AuthError::MissingCredentials)?;
        if !scheme.eq_ignore_ascii_case("Basic") {
            return Err(AuthError::MissingCredentials);
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| AuthError::MissingCredentials)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MissingCredentials)?;

        let (principal, secret) = decoded
            .split_once(':')
            .ok_or(AuthError::MissingCredentials)?;
        if principal.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        Ok(Self {
            principal: principal.to_string(),
            secret: secret.to_string(),
        })
    }
}

impl<S> FromRequestParts<S> for BasicCredentials
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingCredentials)?
            .to_str()
            .map_err(|_| AuthError::MissingCredentials)?;

        Self::parse(header)
    }
}
