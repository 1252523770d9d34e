use axum::{
    routing::{get, post},
    Router,
};

use crate::features::users::handlers::{user_handler, UserAdminState};

/// Create admin routes for managing users
pub fn routes(state: UserAdminState) -> Router {
    Router::new()
        .route("/admin/users", get(user_handler::list_users_page))
        .route(
            "/admin/users/{id}/edit",
            get(user_handler::edit_user_page).post(user_handler::update_user),
        )
        .route("/admin/users/{id}/delete", post(user_handler::delete_user))
        .with_state(state)
}
