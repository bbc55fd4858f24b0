// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization middleware for Axum.
//!
//! A [`Guard`] runs once per request:
//!
//! 1. **NoToken → TokenExtracted**: read `Authorization: Bearer <token>`
//!    (absent or malformed header → `MissingCredentials`)
//! 2. **TokenExtracted → ClaimsVerified**: validate the token
//!    (any failure → `Unauthorized`, exact reason logged)
//! 3. **ClaimsVerified → Authorized**: evaluate the route rule
//!    (deny → `Forbidden`)
//!
//! On success the claims are inserted into request extensions and the
//! request is forwarded. If an outer guard already verified the request,
//! its claims are reused and only the rule is evaluated.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let admin = Router::new().route("/users", get(list_users));
//! let admin = Guard::authorize(authenticator, Rule::AdminOnly).layer(admin);
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use tracing::Span;

use super::rules::{evaluate, ResourceContext, Rule};
use super::{AuthError, Authenticator, Claims};

/// Path parameter naming the resource owner, unless overridden.
pub const DEFAULT_OWNER_PARAM: &str = "user_id";

/// Middleware state: the authenticator plus the rule bound to the route.
#[derive(Clone)]
pub struct Guard {
    authenticator: Arc<Authenticator>,
    rule: Option<Rule>,
    owner_param: &'static str,
    log: Span,
}

impl Guard {
    /// Require a valid bearer token, no rule.
    pub fn authenticate(authenticator: Arc<Authenticator>) -> Self {
        let log = authenticator.log().clone();
        Self {
            authenticator,
            rule: None,
            owner_param: DEFAULT_OWNER_PARAM,
            log,
        }
    }

    /// Require a valid bearer token whose claims satisfy `rule`.
    pub fn authorize(authenticator: Arc<Authenticator>, rule: Rule) -> Self {
        Self {
            rule: Some(rule),
            ..Self::authenticate(authenticator)
        }
    }

    /// Read the resource owner from a different path parameter.
    pub fn with_owner_param(mut self, name: &'static str) -> Self {
        self.owner_param = name;
        self
    }

    /// Apply this guard to every route of `router`.
    pub fn layer<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(axum::middleware::from_fn_with_state(self, guard))
    }

    /// Run the state machine against request headers.
    ///
    /// `verified` holds claims already placed in the request by an outer guard.
    pub fn check(
        &self,
        headers: &HeaderMap,
        verified: Option<&Claims>,
        ctx: Option<&ResourceContext>,
    ) -> Result<Claims, AuthError> {
        let claims = match verified {
            Some(claims) => claims.clone(),
            None => {
                let token = bearer_token(headers)?;
                self.authenticator.validate_token(token).map_err(|e| {
                    tracing::warn!(parent: &self.log, kind = e.kind(), error = %e, "Rejected bearer token");
                    AuthError::from(e)
                })?
            }
        };

        if let Some(rule) = &self.rule {
            if !evaluate(&claims, rule, ctx) {
                tracing::warn!(
                    parent: &self.log,
                    subject = %claims.subject,
                    rule = %rule,
                    "Access denied by rule"
                );
                return Err(AuthError::Forbidden);
            }
        }

        Ok(claims)
    }

    async fn resource_context(&self, parts: &mut Parts) -> Option<ResourceContext> {
        if !self.rule.as_ref().is_some_and(Rule::needs_owner) {
            return None;
        }
        let params = RawPathParams::from_request_parts(parts, &()).await.ok()?;
        params
            .iter()
            .find(|(name, _)| *name == self.owner_param)
            .map(|(_, value)| ResourceContext::owned_by(value))
    }
}

/// Extract the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::MissingCredentials)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingCredentials)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("Bearer") || token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(token)
}

/// Guard middleware function. Use through [`Guard::layer`] or
/// `axum::middleware::from_fn_with_state(guard, guard_fn)`.
pub async fn guard(State(guard): State<Guard>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let ctx = guard.resource_context(&mut parts).await;

    match guard.check(&parts.headers, parts.extensions.get::<Claims>(), ctx.as_ref()) {
        Ok(claims) => {
            parts.extensions.insert(claims);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(e) => e.into_response(),
    }
}
