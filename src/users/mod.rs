// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User records and storage.
//!
//! The auth subsystem only sees users through [`IdentityStore`]; every
//! [`UserStore`] is one.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{Identity, IdentityStore, LookupError};

mod memory;

pub use memory::InMemoryUserStore;

/// Stored user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Lowercased email, unique across users
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub roles: BTreeSet<String>,
    pub enabled: bool,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

/// Input for creating a user.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Public view of a user (no password hash).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: BTreeSet<String>,
    pub enabled: bool,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            roles: user.roles,
            enabled: user.enabled,
            date_created: user.date_created,
            date_updated: user.date_updated,
        }
    }
}

/// User storage errors.
#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("email is not unique: {0}")]
    UniqueEmail(String),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("user storage failure: {0}")]
    Backend(String),
}

/// User persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<User, UserStoreError>;

    async fn query_by_id(&self, id: Uuid) -> Result<Option<User>, UserStoreError>;

    async fn query_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;

    async fn list(&self) -> Result<Vec<User>, UserStoreError>;

    /// Remove the user with `id`. Returns `false` if no such user exists.
    async fn delete(&self, id: Uuid) -> Result<bool, UserStoreError>;
}

#[async_trait]
impl<T> IdentityStore for T
where
    T: UserStore + ?Sized,
{
    async fn find_by_principal(&self, principal: &str) -> Result<Option<Identity>, LookupError> {
        let user = self
            .query_by_email(principal)
            .await
            .map_err(|e| LookupError(e.to_string()))?;

        Ok(user.map(|user| Identity {
            id: user.id.to_string(),
            secret_hash: user.password_hash,
            roles: user.roles,
            enabled: user.enabled,
        }))
    }
}

/// Normalize an email address: trimmed and lowercased.
///
/// # Errors
/// Returns `InvalidEmail` unless the address has a non-empty local part and
/// a domain containing a dot.
pub fn normalize_email(email: &str) -> Result<String, UserStoreError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(UserStoreError::InvalidEmail(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_lowercases_and_trims() {
        assert_eq!(
            normalize_email("  Ada@Example.COM ").unwrap(),
            "ada@example.com"
        );
    }

    #[test]
    fn normalize_email_rejects_invalid_addresses() {
        for email in ["", "ada", "@example.com", "ada@", "ada@localhost", "a b@example.com", "a@b@c.com"] {
            assert!(
                matches!(normalize_email(email), Err(UserStoreError::InvalidEmail(_))),
                "{email}"
            );
        }
    }

    #[test]
    fn user_response_omits_password_hash() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            roles: BTreeSet::new(),
            enabled: true,
            date_created: now,
            date_updated: now,
        };
        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("ada@example.com"));
    }

    #[tokio::test]
    async fn identity_lookup_maps_user_fields() {
        let store = InMemoryUserStore::new();
        let user = store
            .create(NewUser {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "secret".to_string(),
                roles: ["admin".to_string()].into(),
                enabled: true,
            })
            .await
            .unwrap();

        let identity = store.find_by_principal("ADA@example.com").await.unwrap().unwrap();
        assert_eq!(identity.id, user.id.to_string());
        assert_eq!(identity.secret_hash, user.password_hash);
        assert!(identity.roles.contains("admin"));

        assert!(store.find_by_principal("bob@example.com").await.unwrap().is_none());
    }
}
