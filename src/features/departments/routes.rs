use axum::{
    routing::{get, post},
    Router,
};

use crate::features::departments::handlers::{department_handler, DepartmentState};

/// Create admin routes for managing departments
pub fn routes(state: DepartmentState) -> Router {
    Router::new()
        .route(
            "/admin/departments",
            get(department_handler::list_departments_page)
                .post(department_handler::create_department),
        )
        .route(
            "/admin/departments/{id}/delete",
            post(department_handler::delete_department),
        )
        .route(
            "/admin/departments/{id}/files",
            get(department_handler::department_files_page),
        )
        .with_state(state)
}
