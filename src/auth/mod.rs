// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Token issuance and request authorization for the Keygate API.
//!
//! ## Issuance Flow
//!
//! 1. Client calls `GET /v1/users/token/{kid}` with HTTP Basic credentials
//! 2. [`Authenticator::authenticate`] looks up the user and checks the
//!    Argon2 password hash
//! 3. [`Authenticator::generate_token`] signs the claims with the key
//!    registered under `kid` in the [`KeyStore`]
//!
//! ## Request Flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. [`Guard`] middleware:
//!    - resolves the verification key by the `kid` in the token header
//!    - verifies signature, validity window, and issuer
//!    - evaluates the route [`Rule`] against the claims
//! 3. Handlers read the claims with the [`Auth`] extractor
//!
//! ## Security
//!
//! - Signing keys are loaded once at startup and never mutated
//! - Verification failures reach clients only as `401 unauthorized`
//! - Unknown users and wrong passwords are indistinguishable to clients
//! - Clock skew tolerance is zero

pub mod authenticator;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod keystore;
pub mod middleware;
pub mod roles;
pub mod rules;
pub mod token;

#[cfg(test)]
pub(crate) mod testutil;

pub use authenticator::{Authenticator, CredentialError, Identity, IdentityStore, LookupError};
pub use claims::Claims;
pub use error::AuthError;
pub use extractor::{Auth, BasicCredentials};
pub use keystore::{KeyStore, KeyStoreError, SigningKey, VerificationKey};
pub use middleware::Guard;
pub use roles::Role;
pub use rules::{evaluate, ResourceContext, Rule};
pub use token::{KeyResolver, TokenCodec, TokenError};
