// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims.

use std::collections::BTreeSet;

use std::fmt;

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Identity and authorization payload carried by a bearer token.
///
/// Serialized with the registered JWT claim names (`sub`, `iss`, `iat`,
/// `exp`) plus a `roles` array. Timestamps are UNIX seconds (UTC);
/// fractional values from other issuers are truncated on read.
///
/// Verified claims are inserted into request extensions by the auth
/// middleware, so handlers can read them with the `Auth` extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Subject (user ID)
    #[serde(rename = "sub")]
    pub subject: String,

    /// Issuer
    #[serde(rename = "iss")]
    pub issuer: String,

    /// Issued at timestamp
    #[serde(rename = "iat", deserialize_with = "numeric_date")]
    pub issued_at: i64,

    /// Expiration timestamp
    #[serde(rename = "exp", deserialize_with = "numeric_date")]
    pub expires_at: i64,

    /// Granted roles
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Claims {
    /// Check if the claims grant `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role.as_str())
    }

    /// Check the claims are signable: non-empty subject and a
    /// validity window that ends after it starts.
    pub fn validate(&self) -> Result<(), String> {
        if self.subject.is_empty() {
            return Err("subject must not be empty".to_string());
        }
        if self.expires_at <= self.issued_at {
            return Err(format!(
                "expires_at ({}) must be after issued_at ({})",
                self.expires_at, self.issued_at
            ));
        }
        Ok(())
    }
}

/// Read a JWT NumericDate as whole seconds.
fn numeric_date<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumericDate;

    impl Visitor<'_> for NumericDate {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number of seconds since the UNIX epoch")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            if !v.is_finite() || v < i64::MIN as f64 || v >= i64::MAX as f64 {
                return Err(E::invalid_value(Unexpected::Float(v), &self));
            }
            Ok(v.trunc() as i64)
        }
    }

    deserializer.deserialize_any(NumericDate)
}
