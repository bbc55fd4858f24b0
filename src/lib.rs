// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Keygate - Multi-key Token Issuer
//!
//! Issues signed bearer tokens for user credentials and guards HTTP routes
//! with composable authorization rules.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Key store, token codec, authenticator, rules, and middleware
//! - `config` - Environment configuration
//! - `users` - User records and storage

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;
pub mod users;
