// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use tracing::Span;

use crate::auth::Authenticator;
use crate::error::ApiError;
use crate::users::{UserStore, UserStoreError};

#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub users: Arc<dyn UserStore>,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
    /// Parent span for handler events
    pub log: Span,
}

impl AppState {
    pub fn new(
        authenticator: Arc<Authenticator>,
        users: Arc<dyn UserStore>,
        token_ttl: Duration,
        log: Span,
    ) -> Self {
        Self {
            authenticator,
            users,
            token_ttl,
            log,
        }
    }

    /// Convert a store failure into a response, logging failures the
    /// client is not told about.
    pub fn store_error(&self, err: UserStoreError) -> ApiError {
        if matches!(err, UserStoreError::Hashing(_) | UserStoreError::Backend(_)) {
            tracing::error!(parent: &self.log, error = %err, "User store failure");
        }
        ApiError::from(err)
    }
}
