// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use std::collections::BTreeSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{Auth, AuthError, BasicCredentials, Claims, Role, TokenError};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::{normalize_email, NewUser, UserResponse};

/// Response for GET /v1/users/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// Caller's user ID
    pub user_id: String,
    /// Roles granted by the token
    pub roles: BTreeSet<String>,
    /// Token expiry (UNIX seconds)
    pub expires_at: i64,
}

impl From<Claims> for UserMeResponse {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.subject,
            roles: claims.roles,
            expires_at: claims.expires_at,
        }
    }
}

/// Issue a token signed with the key registered under `kid`.
///
/// Credentials are HTTP Basic with the user's email as principal. The
/// response body is the raw compact token.
#[utoipa::path(
    get,
    path = "/v1/users/token/{kid}",
    tag = "Users",
    security(("basic" = [])),
    params(("kid" = String, Path, description = "Signing key identifier")),
    responses(
        (status = 200, description = "Signed token", body = String, content_type = "text/plain"),
        (status = 400, description = "Principal is not a valid email"),
        (status = 401, description = "Missing or rejected credentials"),
        (status = 404, description = "No signing key under kid"),
    )
)]
pub async fn token(
    State(state): State<AppState>,
    Path(kid): Path<String>,
    creds: BasicCredentials,
) -> Result<String, AuthError> {
    let email = normalize_email(&creds.principal)
        .map_err(|e| AuthError::InvalidRequest(e.to_string()))?;

    let authenticator = &state.authenticator;
    let identity = authenticator
        .authenticate(state.users.as_ref(), &email, &creds.secret)
        .await?;

    let now = Utc::now().timestamp();
    let ttl = i64::try_from(state.token_ttl.as_secs()).unwrap_or(i64::MAX);
    let claims = Claims {
        subject: identity.id,
        issuer: authenticator.issuer().to_string(),
        issued_at: now,
        expires_at: now.saturating_add(ttl),
        roles: identity.roles,
    };

    authenticator
        .generate_token(&kid, &claims)
        .map_err(|e| match e {
            TokenError::UnknownKey { kid } => AuthError::SigningKeyNotFound(kid),
            other => AuthError::Internal(other.to_string()),
        })
}

/// Get the current authenticated user's identity and roles.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(claims): Auth) -> Json<UserMeResponse> {
    Json(claims.into())
}

/// List all users (admin only).
#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not an admin"),
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.list().await.map_err(|e| state.store_error(e))?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Create a user (admin only).
#[utoipa::path(
    post,
    path = "/v1/users",
    tag = "Users",
    security(("bearer" = [])),
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid user fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "Email already registered"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if new_user.name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    if new_user.password.is_empty() {
        return Err(ApiError::bad_request("password must not be empty"));
    }
    new_user.roles = new_user
        .roles
        .iter()
        .map(|r| {
            Role::parse(r)
                .map(|role| role.as_str().to_string())
                .ok_or_else(|| ApiError::bad_request(format!("unknown role: {r}")))
        })
        .collect::<Result<BTreeSet<_>, ApiError>>()?;

    let user = state
        .users
        .create(new_user)
        .await
        .map_err(|e| state.store_error(e))?;
    tracing::info!(parent: &state.log, user_id = %user.id, "Created user");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Get a user by ID (admin or the user themselves).
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither admin nor the user"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = Uuid::parse_str(&user_id).map_err(|_| ApiError::not_found("user not found"))?;
    let user = state
        .users
        .query_by_id(id)
        .await
        .map_err(|e| state.store_error(e))?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok(Json(user.into()))
}

/// Delete a user by ID (admin or the user themselves).
#[utoipa::path(
    delete,
    path = "/v1/users/{user_id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither admin nor the user"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = Uuid::parse_str(&user_id).map_err(|_| ApiError::not_found("user not found"))?;
    let deleted = state
        .users
        .delete(id)
        .await
        .map_err(|e| state.store_error(e))?;
    if !deleted {
        return Err(ApiError::not_found("user not found"));
    }

    tracing::info!(parent: &state.log, user_id = %id, deleted_by = %claims.subject, "Deleted user");
    Ok(StatusCode::NO_CONTENT)
}
