use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use minijinja::context;
use std::sync::Arc;

use crate::core::error::{AppError, PageResult};
use crate::features::auth::guards::{RequireAdmin, SessionAdmin, SessionUser};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::dashboard::services::DashboardService;
use crate::features::files::dtos::{AdminFilePageDto, FileResponseDto};
use crate::shared::flash::take_flash;
use crate::shared::templates::{render_page, render_template};
use crate::shared::types::{ApiResponse, Meta, PageQuery};

/// `GET /`
pub async fn index(user: Option<AuthenticatedUser>) -> Redirect {
    match user {
        Some(user) => Redirect::to(user.home_path()),
        None => Redirect::to("/login"),
    }
}

/// `GET /dashboard`
pub async fn user_dashboard_page(
    SessionUser(user): SessionUser,
    State(service): State<Arc<DashboardService>>,
    jar: CookieJar,
) -> PageResult<Response> {
    let (jar, flash) = take_flash(jar);
    let dashboard = service.user_dashboard(&user).await?;
    let files = service.files();

    let html = render_page(
        "dashboard.html",
        context! {
            current_user => user,
            flash => flash,
            department_name => dashboard.department_name,
            files => dashboard.files,
            allowed_extensions => files.allowed_extensions(),
            max_file_size_mb => files.max_file_size_mb(),
        },
    )?;

    Ok((jar, html).into_response())
}

/// `GET /admin/dashboard?page=N`
pub async fn admin_dashboard_page(
    SessionAdmin(admin): SessionAdmin,
    State(service): State<Arc<DashboardService>>,
    Query(query): Query<PageQuery>,
    jar: CookieJar,
) -> PageResult<Response> {
    let (jar, flash) = take_flash(jar);
    let dashboard = service.admin_dashboard(query.page()).await?;

    let html = render_page(
        "admin/dashboard.html",
        context! {
            current_user => admin,
            flash => flash,
            files => dashboard.page.files,
            current_page => dashboard.page.current_page,
            total_pages => dashboard.page.total_pages,
            total => dashboard.page.total,
            departments => dashboard.departments,
        },
    )?;

    Ok((jar, html).into_response())
}

/// Page through all files (admin dashboard AJAX)
#[utoipa::path(
    get,
    path = "/api/admin/files",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of files with table rows", body = ApiResponse<AdminFilePageDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    tag = "admin",
    security(
        ("session_cookie" = [])
    )
)]
pub async fn list_admin_files(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<DashboardService>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<AdminFilePageDto>>, AppError> {
    let page = service.admin_files_page(query.page()).await?;

    let table_html = render_template("admin/file_rows.html", context! { files => &page.files })?;
    let total = page.total;

    let dto = AdminFilePageDto {
        items: page.files.into_iter().map(FileResponseDto::from).collect(),
        current_page: page.current_page,
        total_pages: page.total_pages,
        table_html,
    };

    Ok(Json(ApiResponse::success(Some(dto), None, Some(Meta { total }))))
}
