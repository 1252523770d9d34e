use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::dashboard::handlers;
use crate::features::dashboard::services::DashboardService;

/// Landing redirect, personal dashboard and admin dashboard
pub fn routes(dashboard_service: Arc<DashboardService>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/dashboard", get(handlers::user_dashboard_page))
        .route("/admin/dashboard", get(handlers::admin_dashboard_page))
        .route("/api/admin/files", get(handlers::list_admin_files))
        .with_state(dashboard_service)
}
