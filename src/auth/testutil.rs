// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared helpers for auth tests: deterministic Ed25519 keys and claims.

use std::collections::BTreeSet;
use std::sync::Arc;

use ed25519_dalek::pkcs8::EncodePrivateKey;
use tracing::Span;

use super::{Authenticator, Claims, KeyStore};

pub const TEST_ISSUER: &str = "service";

/// PKCS#8 PEM for an Ed25519 key derived from a fixed seed byte.
pub fn test_key_pem(seed: u8) -> String {
    let key = ed25519_dalek::SigningKey::from_bytes(&[seed; 32]);
    let der = key.to_pkcs8_der().expect("encode test key");
    pem::encode(&pem::Pem::new("PRIVATE KEY", der.as_bytes().to_vec()))
}

/// Store holding one key per `(kid, seed)` pair.
pub fn test_store(keys: &[(&str, u8)]) -> KeyStore {
    let mut store = KeyStore::new();
    for (kid, seed) in keys {
        store
            .add_key(*kid, test_key_pem(*seed).as_bytes())
            .expect("add test key");
    }
    store
}

pub fn test_authenticator() -> Authenticator {
    Authenticator::new(Arc::new(test_store(&[("1", 1)])), TEST_ISSUER, Span::none())
}

pub fn claims_at(subject: &str, roles: &[&str], issued_at: i64, ttl: i64) -> Claims {
    Claims {
        subject: subject.to_string(),
        issuer: TEST_ISSUER.to_string(),
        issued_at,
        expires_at: issued_at + ttl,
        roles: roles.iter().map(|r| r.to_string()).collect::<BTreeSet<_>>(),
    }
}

/// Claims valid for the next hour.
pub fn fresh_claims(subject: &str, roles: &[&str]) -> Claims {
    claims_at(subject, roles, chrono::Utc::now().timestamp(), 3600)
}
