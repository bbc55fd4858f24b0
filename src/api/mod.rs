// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{Claims, Guard, Role, Rule},
    state::AppState,
    users::{NewUser, UserResponse},
};

pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let auth = state.authenticator.clone();

    let public = Router::new().route("/users/token/{kid}", get(users::token));

    let authenticated = Guard::authorize(auth.clone(), Rule::Authenticated)
        .layer(Router::new().route("/users/me", get(users::get_current_user)));

    let admin = Guard::authorize(auth.clone(), Rule::AdminOnly).layer(
        Router::new().route("/users", get(users::list_users).post(users::create_user)),
    );

    let owner = Guard::authorize(auth, Rule::AdminOrSubject)
        .layer(Router::new().route(
            "/users/{user_id}",
            get(users::get_user).delete(users::delete_user),
        ));

    let v1_routes = Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .merge(owner);

    Router::new()
        .nest("/v1", v1_routes)
        .route("/health", get(health::health))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "basic",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        users::token,
        users::get_current_user,
        users::list_users,
        users::create_user,
        users::get_user,
        users::delete_user
    ),
    components(
        schemas(
            Claims,
            Role,
            NewUser,
            UserResponse,
            users::UserMeResponse,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Users", description = "Token issuance and user management")
    )
)]
struct ApiDoc;
