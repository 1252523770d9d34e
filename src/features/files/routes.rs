use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{file_handler, file_page_handler};
use crate::features::files::services::FileService;

/// Create routes for the files feature.
///
/// `body_limit` caps the size of a whole upload request.
pub fn routes(file_service: Arc<FileService>, body_limit: usize) -> Router {
    Router::new()
        .route(
            "/files/upload",
            post(file_page_handler::upload_files).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/files/delete", post(file_page_handler::delete_files))
        .route("/files/{id}/download", get(file_page_handler::download_file))
        .route("/files/{id}/delete", post(file_page_handler::delete_file))
        .route(
            "/admin/files/{id}/edit",
            get(file_page_handler::edit_file_page).post(file_page_handler::rename_file),
        )
        .route(
            "/api/files/upload",
            post(file_handler::upload_files).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/files/{id}", delete(file_handler::delete_file))
        .with_state(file_service)
}
