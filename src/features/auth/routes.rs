use crate::features::auth::handlers;
use crate::features::auth::services::AuthService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Login, logout and registration pages
pub fn routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register),
        )
        .route("/api/auth/me", get(handlers::get_me))
        .with_state(service)
}
