//! Browser-facing file routes: form upload, download, delete and admin rename.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::{CookieJar, Form as RepeatedForm, FormRejection};
use minijinja::context;
use std::path::Path as FsPath;
use std::sync::Arc;

use crate::core::error::{AppError, PageResult};
use crate::features::auth::guards::{SessionAdmin, SessionUser};
use crate::features::files::dtos::{BatchDeleteForm, RenameFileForm};
use crate::features::files::handlers::file_handler::read_file_parts;
use crate::features::files::services::FileService;
use crate::shared::flash::{set_flash, take_flash, Flash};
use crate::shared::templates::render_page;

/// `POST /files/upload`
pub async fn upload_files(
    SessionUser(user): SessionUser,
    State(service): State<Arc<FileService>>,
    jar: CookieJar,
    multipart: Result<Multipart, MultipartRejection>,
) -> PageResult<(CookieJar, Redirect)> {
    let parts = match multipart {
        Ok(mut multipart) => read_file_parts(&mut multipart).await.unwrap_or_else(|e| {
            tracing::warn!("Rejected upload form from user {}: {}", user.id, e);
            Vec::new()
        }),
        Err(rejection) => {
            tracing::warn!("Invalid upload request from user {}: {}", user.id, rejection);
            Vec::new()
        }
    };

    let summary = service.upload_many(&user, parts).await?;

    Ok((set_flash(jar, summary.flash()), Redirect::to("/dashboard")))
}

/// `GET /files/{id}/download`
pub async fn download_file(
    SessionUser(user): SessionUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<i64>,
) -> PageResult<Response> {
    let (file, data) = service.download(&user, id).await?;

    let headers = [
        (header::CONTENT_TYPE, content_type_for(&file.filename).to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&file.filename)),
        (header::CONTENT_LENGTH, data.len().to_string()),
    ];

    Ok((headers, data).into_response())
}

/// `POST /files/{id}/delete`
pub async fn delete_file(
    SessionUser(user): SessionUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> PageResult<(CookieJar, Redirect)> {
    let flash = match service.delete(&user, id).await {
        Ok(_) => Flash::success("File deleted successfully."),
        Err(AppError::NotFound(msg)) | Err(AppError::Forbidden(msg)) => Flash::error(msg),
        Err(e) => return Err(e.into()),
    };

    Ok((set_flash(jar, flash), Redirect::to(user.home_path())))
}

/// `POST /files/delete` with `file_ids` repeated once per selected file
pub async fn delete_files(
    SessionUser(user): SessionUser,
    State(service): State<Arc<FileService>>,
    jar: CookieJar,
    form: Result<RepeatedForm<BatchDeleteForm>, FormRejection>,
) -> PageResult<(CookieJar, Redirect)> {
    let ids = form.map(|RepeatedForm(f)| f.ids()).unwrap_or_default();

    let summary = service.delete_many(&user, &ids).await;

    Ok((set_flash(jar, summary.flash()), Redirect::to(user.home_path())))
}

/// `GET /admin/files/{id}/edit`
pub async fn edit_file_page(
    SessionAdmin(admin): SessionAdmin,
    State(service): State<Arc<FileService>>,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> PageResult<Response> {
    let Some(file) = service.find_by_id(id).await? else {
        let jar = set_flash(jar, Flash::error("File not found."));
        return Ok((jar, Redirect::to("/admin/dashboard")).into_response());
    };

    let (jar, flash) = take_flash(jar);
    let extension = FsPath::new(&file.filename)
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_string);

    let html: Html<String> = render_page(
        "admin/edit_file.html",
        context! {
            current_user => admin,
            flash => flash,
            file_id => file.id,
            filename => file.filename,
            extension => extension,
        },
    )?;

    Ok((jar, html).into_response())
}

/// `POST /admin/files/{id}/edit`
pub async fn rename_file(
    SessionAdmin(_admin): SessionAdmin,
    State(service): State<Arc<FileService>>,
    Path(id): Path<i64>,
    jar: CookieJar,
    Form(form): Form<RenameFileForm>,
) -> PageResult<(CookieJar, Redirect)> {
    let (flash, target) = match service.rename(id, form.into()).await {
        Ok(_) => (
            Flash::success("File updated successfully."),
            "/admin/dashboard".to_string(),
        ),
        Err(AppError::Validation(msg)) => (Flash::error(msg), format!("/admin/files/{}/edit", id)),
        Err(AppError::NotFound(msg)) => (Flash::error(msg), "/admin/dashboard".to_string()),
        Err(e) => return Err(e.into()),
    };

    Ok((set_flash(jar, flash), Redirect::to(&target)))
}

fn content_type_for(filename: &str) -> &'static str {
    let extension = FsPath::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "txt" => "text/plain; charset=utf-8",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}

/// `attachment` disposition with an ASCII fallback and the RFC 5987 UTF-8 name
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_escapes_names() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\"; filename*=UTF-8''report.pdf"
        );
        assert_eq!(
            content_disposition("a\"b é.txt"),
            "attachment; filename=\"a_b _.txt\"; filename*=UTF-8''a%22b%20%C3%A9.txt"
        );
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("x.PDF"), "application/pdf");
        assert_eq!(content_type_for("x.txt"), "text/plain; charset=utf-8");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
