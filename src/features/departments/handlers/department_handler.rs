use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use minijinja::context;
use std::sync::Arc;

use crate::core::error::{AppError, PageResult};
use crate::features::auth::guards::SessionAdmin;
use crate::features::departments::dtos::CreateDepartmentForm;
use crate::features::departments::services::DepartmentService;
use crate::features::files::FileService;
use crate::shared::flash::{set_flash, take_flash, Flash};
use crate::shared::templates::render_page;

/// State for department handlers
#[derive(Clone)]
pub struct DepartmentState {
    pub departments: Arc<DepartmentService>,
    pub files: Arc<FileService>,
}

/// `GET /admin/departments`
pub async fn list_departments_page(
    SessionAdmin(admin): SessionAdmin,
    State(state): State<DepartmentState>,
    jar: CookieJar,
) -> PageResult<Response> {
    let (jar, flash) = take_flash(jar);
    let departments = state.departments.list_with_counts().await?;

    let html = render_page(
        "admin/departments.html",
        context! {
            current_user => admin,
            flash => flash,
            departments => departments,
        },
    )?;

    Ok((jar, html).into_response())
}

/// `POST /admin/departments`
pub async fn create_department(
    SessionAdmin(_admin): SessionAdmin,
    State(state): State<DepartmentState>,
    jar: CookieJar,
    Form(form): Form<CreateDepartmentForm>,
) -> PageResult<(CookieJar, Redirect)> {
    let flash = match state.departments.create(&form.name).await {
        Ok(department) => Flash::success(format!(
            "Department '{}' added successfully.",
            department.name
        )),
        Err(AppError::Validation(msg)) | Err(AppError::Conflict(msg)) => Flash::error(msg),
        Err(e) => return Err(e.into()),
    };

    Ok((set_flash(jar, flash), Redirect::to("/admin/departments")))
}

/// `POST /admin/departments/{id}/delete`
pub async fn delete_department(
    SessionAdmin(_admin): SessionAdmin,
    State(state): State<DepartmentState>,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> PageResult<(CookieJar, Redirect)> {
    let flash = match state.departments.delete(id).await {
        Ok(department) => Flash::success(format!(
            "Department '{}' deleted successfully.",
            department.name
        )),
        Err(AppError::NotFound(msg)) | Err(AppError::Conflict(msg)) => Flash::error(msg),
        Err(e) => return Err(e.into()),
    };

    Ok((set_flash(jar, flash), Redirect::to("/admin/departments")))
}

/// `GET /admin/departments/{id}/files`
pub async fn department_files_page(
    SessionAdmin(admin): SessionAdmin,
    State(state): State<DepartmentState>,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> PageResult<Response> {
    let Some(department) = state.departments.find_by_id(id).await? else {
        let jar = set_flash(jar, Flash::error("Department not found."));
        return Ok((jar, Redirect::to("/admin/dashboard")).into_response());
    };

    let (jar, flash) = take_flash(jar);
    let files = state.files.list_for_department(department.id).await?;

    let html = render_page(
        "admin/department_files.html",
        context! {
            current_user => admin,
            flash => flash,
            department => department,
            files => files,
        },
    )?;

    Ok((jar, html).into_response())
}
