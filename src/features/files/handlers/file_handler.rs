use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{DeleteFileResponseDto, UploadFilesDto, UploadResultDto};
use crate::features::files::services::{FileService, IncomingFile};
use crate::shared::types::ApiResponse;

/// Field names accepted for file parts
const FILE_FIELDS: &[&str] = &["files", "files[]", "uploaded_files[]", "file"];

/// Collect every file part of an upload form
pub(crate) async fn read_file_parts(
    multipart: &mut Multipart,
) -> Result<Vec<IncomingFile>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        if !FILE_FIELDS.contains(&field_name.as_str()) {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        let data = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        files.push(IncomingFile {
            filename,
            data: data.to_vec(),
        });
    }

    Ok(files)
}

/// Upload one or more files
///
/// Each part of the `files` field is checked and stored on its own; the
/// response lists stored files and per-file errors.
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(
        content = UploadFilesDto,
        content_type = "multipart/form-data",
        description = "Files to upload, repeated under the `files` field",
    ),
    responses(
        (status = 201, description = "At least one file stored", body = ApiResponse<UploadResultDto>),
        (status = 400, description = "No file stored", body = ApiResponse<UploadResultDto>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("session_cookie" = [])
    )
)]
pub async fn upload_files(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadResultDto>>), AppError> {
    let parts = read_file_parts(&mut multipart).await?;
    let summary = service.upload_many(&user, parts).await?;

    if summary.is_empty() {
        return Err(AppError::BadRequest(
            "No files selected for upload or invalid request.".to_string(),
        ));
    }

    let flash = summary.flash();
    let any_stored = !summary.stored.is_empty();
    let result = UploadResultDto {
        files: summary.stored.into_iter().map(Into::into).collect(),
        errors: summary.errors,
    };
    let message = Some(flash.messages.join("\n"));

    if any_stored {
        Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(Some(result), message, None)),
        ))
    } else {
        let errors = Some(result.errors.clone());
        Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse {
                success: false,
                data: Some(result),
                message,
                meta: None,
                errors,
            }),
        ))
    }
}

/// Delete a file
///
/// The owner or an administrator may delete. The admin dashboard calls this
/// from its delete confirmation.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted", body = ApiResponse<DeleteFileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not allowed to delete this file"),
        (status = 404, description = "File not found")
    ),
    security(
        ("session_cookie" = [])
    )
)]
pub async fn delete_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeleteFileResponseDto>>, AppError> {
    service.delete(&user, id).await?;

    let message = "File deleted successfully.".to_string();
    Ok(Json(ApiResponse::success(
        Some(DeleteFileResponseDto {
            deleted: true,
            message: message.clone(),
            message_type: "success".to_string(),
        }),
        Some(message),
        None,
    )))
}
