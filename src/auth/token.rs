// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token signing and verification.
//!
//! Tokens are compact JWS (`header.payload.signature`, base64url) signed
//! with EdDSA. The header names the `kid` of the signing key; verification
//! resolves the matching public key through a [`KeyResolver`].
//!
//! ## Time Checks
//!
//! Timestamps are compared at second granularity with zero clock skew
//! tolerance. A token is valid for `issued_at <= now < expires_at`.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Header, Validation};

use super::claims::Claims;
use super::keystore::{KeyStore, VerificationKey, KEY_ALGORITHM};

/// Token errors.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The kid is not present in the key store
    #[error("unknown signing key: {kid}")]
    UnknownKey { kid: String },

    /// Signature does not match the token contents
    #[error("token signature is invalid")]
    InvalidSignature,

    /// Current time is at or past `exp`
    #[error("token has expired")]
    Expired,

    /// Current time is before `iat`
    #[error("token is not yet valid")]
    NotYetValid,

    /// Issuer does not match the expected issuer
    #[error("token issuer is invalid: {0}")]
    InvalidIssuer(String),

    /// Token cannot be parsed as a signed token of the expected shape
    #[error("token is malformed: {0}")]
    Malformed(String),

    /// Claims are not signable
    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    /// Encoding or signing failed
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl TokenError {
    /// Short machine-readable kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::UnknownKey { .. } => "unknown_key",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "expired",
            TokenError::NotYetValid => "not_yet_valid",
            TokenError::InvalidIssuer(_) => "invalid_issuer",
            TokenError::Malformed(_) => "malformed",
            TokenError::InvalidClaims(_) => "invalid_claims",
            TokenError::Signing(_) => "signing_failed",
        }
    }
}

/// Lookup of verification keys by kid.
pub trait KeyResolver {
    fn resolve(&self, kid: &str) -> Option<&VerificationKey>;
}

impl KeyResolver for KeyStore {
    fn resolve(&self, kid: &str) -> Option<&VerificationKey> {
        self.public_key(kid).ok()
    }
}

/// Signs and verifies tokens for a single issuer.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    issuer: String,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(issuer: impl Into<String>) -> Self {
        // Time window and issuer are checked by hand against an explicit `now`.
        let mut validation = Validation::new(KEY_ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            issuer: issuer.into(),
            validation,
        }
    }

    /// Expected issuer.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Sign `claims` with the key registered under `kid`.
    pub fn sign(&self, keys: &KeyStore, kid: &str, claims: &Claims) -> Result<String, TokenError> {
        let key = keys.private_key(kid).map_err(|_| TokenError::UnknownKey {
            kid: kid.to_string(),
        })?;
        claims.validate().map_err(TokenError::InvalidClaims)?;

        let mut header = Header::new(key.algorithm());
        header.kid = Some(key.kid().to_string());

        encode(&header, claims, key.encoding_key()).map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify `token` against the current time.
    pub fn verify<R>(&self, token: &str, keys: &R) -> Result<Claims, TokenError>
    where
        R: KeyResolver + ?Sized,
    {
        self.verify_at(token, keys, Utc::now().timestamp())
    }

    /// Verify `token` as of `now` (UNIX seconds).
    pub fn verify_at<R>(&self, token: &str, keys: &R, now: i64) -> Result<Claims, TokenError>
    where
        R: KeyResolver + ?Sized,
    {
        let header =
            decode_header(token).map_err(|e| TokenError::Malformed(format!("invalid header: {e}")))?;
        if header.alg != KEY_ALGORITHM {
            return Err(TokenError::Malformed(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or_else(|| TokenError::Malformed("header has no kid".to_string()))?;

        // An expired token is reported as expired whatever its signature.
        if let Ok(unverified) = jsonwebtoken::dangerous::insecure_decode::<Claims>(token) {
            if now >= unverified.claims.expires_at {
                return Err(TokenError::Expired);
            }
        }

        let key = keys.resolve(&kid).ok_or(TokenError::UnknownKey { kid })?;

        let claims = decode::<Claims>(token, key.decoding_key(), &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })?
            .claims;

        if now >= claims.expires_at {
            return Err(TokenError::Expired);
        }
        if now < claims.issued_at {
            return Err(TokenError::NotYetValid);
        }
        if claims.issuer != self.issuer {
            return Err(TokenError::InvalidIssuer(claims.issuer));
        }

        Ok(claims)
    }
}
