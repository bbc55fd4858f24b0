// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory user store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{normalize_email, NewUser, User, UserStore, UserStoreError};
use crate::auth::authenticator::hash_secret;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, UserStoreError> {
        let email = normalize_email(&new_user.email)?;
        let password_hash =
            hash_secret(&new_user.password).map_err(|e| UserStoreError::Hashing(e.to_string()))?;

        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == email) {
            return Err(UserStoreError::UniqueEmail(email));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email,
            password_hash,
            roles: new_user.roles,
            enabled: new_user.enabled,
            date_created: now,
            date_updated: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn query_by_id(&self, id: Uuid) -> Result<Option<User>, UserStoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn query_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        let Ok(email) = normalize_email(email) else {
            return Ok(None);
        };
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserStoreError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.date_created.cmp(&b.date_created).then(a.email.cmp(&b.email)));
        Ok(users)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, UserStoreError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}
