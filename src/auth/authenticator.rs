// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential checks, token issuance, and token validation.
//!
//! [`Authenticator`] ties a frozen [`KeyStore`] to a [`TokenCodec`] for one
//! issuer. Identity lookup is delegated to an [`IdentityStore`].

use std::collections::BTreeSet;
use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use tracing::Span;

use super::claims::Claims;
use super::keystore::KeyStore;
use super::token::{TokenCodec, TokenError};

/// Identity record returned by an [`IdentityStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Opaque identity ID, used as the token subject
    pub id: String,
    /// Argon2 PHC hash of the secret
    pub secret_hash: String,
    /// Granted roles
    pub roles: BTreeSet<String>,
    /// Disabled identities cannot authenticate
    pub enabled: bool,
}

/// Failure of the identity store itself (not "not found").
#[derive(Debug, thiserror::Error)]
#[error("identity lookup failed: {0}")]
pub struct LookupError(pub String);

/// Identity lookup by principal (e.g. an email address).
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_principal(&self, principal: &str) -> Result<Option<Identity>, LookupError>;
}

/// Credential check errors.
///
/// `IdentityNotFound` and `AuthenticationFailure` are kept apart for logs
/// only; both convert to the same transport error.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("identity not found")]
    IdentityNotFound,

    #[error("authentication failed: {0}")]
    AuthenticationFailure(&'static str),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

const DUMMY_SECRET: &str = "keygate-timing-equalizer";

/// Issues and validates tokens with keys from a [`KeyStore`].
pub struct Authenticator {
    keys: Arc<KeyStore>,
    codec: TokenCodec,
    log: Span,
    /// Verified against when the identity is unknown
    dummy_hash: Option<String>,
}

impl Authenticator {
    /// Create an authenticator for `issuer`.
    ///
    /// Every event the authenticator logs is parented to `log`.
    pub fn new(keys: Arc<KeyStore>, issuer: impl Into<String>, log: Span) -> Self {
        let dummy_hash = hash_secret(DUMMY_SECRET)
            .inspect_err(|e| {
                tracing::warn!(parent: &log, error = %e, "Failed to prepare timing equalizer hash")
            })
            .ok();
        Self {
            keys,
            codec: TokenCodec::new(issuer),
            log,
            dummy_hash,
        }
    }

    pub fn issuer(&self) -> &str {
        self.codec.issuer()
    }

    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    pub fn log(&self) -> &Span {
        &self.log
    }

    /// Look up `principal` and check `secret` against its stored hash.
    ///
    /// When the identity does not exist a dummy hash is still verified,
    /// so both failure paths cost the same.
    pub async fn authenticate<S>(
        &self,
        store: &S,
        principal: &str,
        secret: &str,
    ) -> Result<Identity, CredentialError>
    where
        S: IdentityStore + ?Sized,
    {
        let lookup = store.find_by_principal(principal).await.inspect_err(|e| {
            tracing::error!(parent: &self.log, principal, error = %e, "Identity lookup failed")
        })?;
        let Some(identity) = lookup else {
            if let Some(dummy) = self.dummy_hash.as_deref() {
                let _ = verify_secret(secret, dummy);
            }
            tracing::warn!(parent: &self.log, principal, "Authentication failed: identity not found");
            return Err(CredentialError::IdentityNotFound);
        };

        if !verify_secret(secret, &identity.secret_hash) {
            tracing::warn!(parent: &self.log, principal, "Authentication failed: secret mismatch");
            return Err(CredentialError::AuthenticationFailure("secret mismatch"));
        }

        if !identity.enabled {
            tracing::warn!(parent: &self.log, principal, "Authentication failed: identity disabled");
            return Err(CredentialError::AuthenticationFailure("identity disabled"));
        }

        tracing::debug!(parent: &self.log, principal, subject = %identity.id, "Authenticated");
        Ok(identity)
    }

    /// Sign caller-supplied `claims` with the key under `kid`.
    pub fn generate_token(&self, kid: &str, claims: &Claims) -> Result<String, TokenError> {
        let result = self.codec.sign(&self.keys, kid, claims);
        match &result {
            Ok(_) => {
                tracing::info!(parent: &self.log, kid, subject = %claims.subject, "Issued token")
            }
            Err(e) => {
                tracing::warn!(parent: &self.log, kid, kind = e.kind(), error = %e, "Token issuance failed")
            }
        }
        result
    }

    /// Validate `token` against the key store at the current time.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.codec.verify(token, self.keys.as_ref())
    }

    /// Validate `token` as of `now` (UNIX seconds).
    pub fn validate_token_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        self.codec.verify_at(token, self.keys.as_ref(), now)
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("issuer", &self.issuer())
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

/// Hash `secret` into an Argon2 PHC string with a fresh salt.
pub fn hash_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(secret.as_bytes(), &salt)?
        .to_string())
}

/// Constant-time check of `secret` against a PHC hash. Unparsable hashes never match.
pub fn verify_secret(secret: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}
