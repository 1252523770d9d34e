use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use minijinja::context;
use std::sync::Arc;

use crate::core::error::{AppError, PageResult};
use crate::features::auth::guards::SessionAdmin;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::departments::DepartmentService;
use crate::features::users::dtos::{EditUserErrors, EditUserForm};
use crate::features::users::services::{EditUserOutcome, UserService};
use crate::shared::flash::{set_flash, take_flash, Flash};
use crate::shared::templates::render_page;

/// State for user administration handlers
#[derive(Clone)]
pub struct UserAdminState {
    pub users: Arc<UserService>,
    pub departments: Arc<DepartmentService>,
}

/// `GET /admin/users`
pub async fn list_users_page(
    SessionAdmin(admin): SessionAdmin,
    State(state): State<UserAdminState>,
    jar: CookieJar,
) -> PageResult<Response> {
    let (jar, flash) = take_flash(jar);
    let users = state.users.list_non_admin().await?;

    let html = render_page(
        "admin/users.html",
        context! {
            current_user => admin,
            flash => flash,
            users => users,
        },
    )?;

    Ok((jar, html).into_response())
}

/// `GET /admin/users/{id}/edit`
pub async fn edit_user_page(
    SessionAdmin(admin): SessionAdmin,
    State(state): State<UserAdminState>,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> PageResult<Response> {
    let Some(user) = state.users.find_by_id(id).await? else {
        return Ok(Redirect::to("/admin/users").into_response());
    };

    let (jar, flash) = take_flash(jar);
    let form = EditUserForm {
        username: user.username,
        department_id: user.department_id.map(|d| d.to_string()).unwrap_or_default(),
    };

    let html = render_edit_form(&state, &admin, id, &form, EditUserErrors::default(), flash)
        .await?;

    Ok((jar, html).into_response())
}

/// `POST /admin/users/{id}/edit`
pub async fn update_user(
    SessionAdmin(admin): SessionAdmin,
    State(state): State<UserAdminState>,
    Path(id): Path<i64>,
    jar: CookieJar,
    Form(form): Form<EditUserForm>,
) -> PageResult<Response> {
    let submitted = form.clone();

    match state.users.update(id, form).await {
        Ok(EditUserOutcome::Updated(_)) => {
            let jar = set_flash(jar, Flash::success("User updated successfully."));
            Ok((jar, Redirect::to("/admin/users")).into_response())
        }
        Ok(EditUserOutcome::Invalid(errors)) => {
            let html = render_edit_form(&state, &admin, id, &submitted, errors, None).await?;
            Ok(html.into_response())
        }
        Err(AppError::NotFound(msg)) => {
            let jar = set_flash(jar, Flash::error(msg));
            Ok((jar, Redirect::to("/admin/users")).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// `POST /admin/users/{id}/delete`
pub async fn delete_user(
    SessionAdmin(_admin): SessionAdmin,
    State(state): State<UserAdminState>,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> PageResult<(CookieJar, Redirect)> {
    let flash = match state.users.delete(id).await {
        Ok(_) => Flash::success("User and their files deleted successfully."),
        Err(AppError::Forbidden(msg)) | Err(AppError::NotFound(msg)) => Flash::error(msg),
        Err(e) => return Err(e.into()),
    };

    Ok((set_flash(jar, flash), Redirect::to("/admin/users")))
}

async fn render_edit_form(
    state: &UserAdminState,
    admin: &AuthenticatedUser,
    id: i64,
    form: &EditUserForm,
    errors: EditUserErrors,
    flash: Option<Flash>,
) -> Result<Html<String>, AppError> {
    let departments = state.departments.list().await?;

    render_page(
        "admin/edit_user.html",
        context! {
            current_user => admin,
            flash => flash,
            user_id => id,
            username => form.username.trim(),
            selected_department => form.department_id.trim(),
            departments => departments,
            errors => errors,
        },
    )
}
