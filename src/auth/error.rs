// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors returned to clients.
//!
//! Component errors (`TokenError`, `CredentialError`) carry the exact
//! failure reason for logs. Converting them into [`AuthError`] collapses
//! them to the few kinds a client is allowed to see.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::authenticator::CredentialError;
use super::token::TokenError;

/// Authentication error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authorization header absent or not in the expected scheme
    MissingCredentials,
    /// Request is well-formed but a credential field is invalid
    InvalidRequest(String),
    /// Bearer token failed verification
    Unauthorized,
    /// Principal/secret pair rejected
    AuthenticationFailure,
    /// Verified claims do not satisfy the route rule
    Forbidden,
    /// Token requested for a kid the key store does not hold
    SigningKeyNotFound(String),
    /// Internal error
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::InvalidRequest(_) => "invalid_request",
            AuthError::Unauthorized => "unauthorized",
            AuthError::AuthenticationFailure => "authentication_failed",
            AuthError::Forbidden => "forbidden",
            AuthError::SigningKeyNotFound(_) => "signing_key_not_found",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials
            | AuthError::Unauthorized
            | AuthError::AuthenticationFailure => StatusCode::UNAUTHORIZED,
            AuthError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::SigningKeyNotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredentials => write!(f, "Missing or malformed credentials"),
            AuthError::InvalidRequest(msg) => write!(f, "Invalid request: {msg}"),
            AuthError::Unauthorized => write!(f, "Unauthorized"),
            AuthError::AuthenticationFailure => write!(f, "Authentication failed"),
            AuthError::Forbidden => write!(f, "Insufficient permissions for this operation"),
            AuthError::SigningKeyNotFound(kid) => write!(f, "Signing key not found: {kid}"),
            AuthError::Internal(_) => write!(f, "Internal authentication error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<TokenError> for AuthError {
    fn from(_: TokenError) -> Self {
        AuthError::Unauthorized
    }
}

impl From<CredentialError> for AuthError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::IdentityNotFound | CredentialError::AuthenticationFailure(_) => {
                AuthError::AuthenticationFailure
            }
            CredentialError::Lookup(e) => AuthError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authenticator::LookupError;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_credentials_returns_401() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "missing_credentials");
    }

    #[tokio::test]
    async fn forbidden_returns_403() {
        let response = AuthError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn every_token_error_collapses_to_unauthorized() {
        let errors = [
            TokenError::UnknownKey { kid: "9".to_string() },
            TokenError::InvalidSignature,
            TokenError::Expired,
            TokenError::NotYetValid,
            TokenError::InvalidIssuer("x".to_string()),
            TokenError::Malformed("x".to_string()),
        ];
        for err in errors {
            assert_eq!(AuthError::from(err), AuthError::Unauthorized);
        }
    }

    #[test]
    fn unknown_identity_and_wrong_secret_are_indistinguishable() {
        let not_found = AuthError::from(CredentialError::IdentityNotFound);
        let mismatch = AuthError::from(CredentialError::AuthenticationFailure("secret mismatch"));
        assert_eq!(not_found, mismatch);
        assert_eq!(not_found.to_string(), mismatch.to_string());
        assert_eq!(not_found.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let err = AuthError::from(CredentialError::Lookup(LookupError("db down".to_string())));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert!(!body.contains("db down"));
    }
}
