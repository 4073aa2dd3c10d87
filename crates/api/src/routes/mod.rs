//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod auth;
pub mod health;
pub mod modules;
pub mod permissions;
pub mod role_permissions;
pub mod roles;
pub mod tenants;
pub mod users;

/// Creates the API router: public routes plus the guarded resource routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(tenants::routes())
        .merge(modules::routes())
        .merge(permissions::routes())
        .merge(roles::routes())
        .merge(role_permissions::routes())
        .merge(users::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::public_routes())
        .merge(protected_routes)
}
