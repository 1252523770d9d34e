use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::CookieJar;
use minijinja::context;
use std::sync::Arc;

use crate::core::error::{PageResult, Result};
use crate::features::auth::dtos::{
    LoginErrors, LoginForm, LoginResponseDto, MeResponseDto, RegisterErrors, RegisterForm,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::{AuthService, LoginOutcome, RegisterOutcome};
use crate::shared::flash::{set_flash, take_flash, Flash};
use crate::shared::templates::render_page;
use crate::shared::types::ApiResponse;

const NO_DEPARTMENTS_MESSAGE: &str = "No departments available. Please contact administrator.";

fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

/// `GET /login`
pub async fn login_page(user: Option<AuthenticatedUser>, jar: CookieJar) -> PageResult<Response> {
    if let Some(user) = user {
        return Ok(Redirect::to(user.home_path()).into_response());
    }

    let (jar, flash) = take_flash(jar);
    let html = render_login(&LoginForm::default(), &LoginErrors::default(), flash)?;

    Ok((jar, html).into_response())
}

/// Sign in with username and password.
///
/// Browsers get a 303 redirect with the session cookie set; requests sent with
/// `X-Requested-With: XMLHttpRequest` get a JSON body instead.
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    params(
        ("X-Requested-With" = Option<String>, Header, description = "Set to XMLHttpRequest for a JSON response")
    ),
    responses(
        (status = 200, description = "Login outcome (AJAX)", body = LoginResponseDto),
        (status = 303, description = "Redirect to the dashboard with the session cookie set")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> PageResult<Response> {
    let ajax = is_ajax(&headers);

    match service.login(&form).await? {
        LoginOutcome::Success { user, token } => {
            let jar = jar.add(service.sessions().session_cookie(token));
            let redirect = user.home_path();

            if ajax {
                let body = LoginResponseDto {
                    success: true,
                    message: Some("Login successful.".to_string()),
                    redirect: Some(redirect.to_string()),
                    errors: None,
                };
                return Ok((jar, Json(body)).into_response());
            }

            Ok((jar, Redirect::to(redirect)).into_response())
        }
        LoginOutcome::Invalid(errors) => {
            if ajax {
                let body = LoginResponseDto {
                    success: false,
                    message: None,
                    redirect: None,
                    errors: Some(errors),
                };
                return Ok(Json(body).into_response());
            }

            Ok(render_login(&form, &errors, None)?.into_response())
        }
    }
}

fn render_login(
    form: &LoginForm,
    errors: &LoginErrors,
    flash: Option<Flash>,
) -> Result<Html<String>> {
    render_page(
        "login.html",
        context! {
            current_user => None::<AuthenticatedUser>,
            flash => flash,
            username => form.username.trim(),
            errors => errors,
        },
    )
}

/// `POST /logout`
pub async fn logout(State(service): State<Arc<AuthService>>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(service.sessions().clear_cookie());
    let jar = set_flash(jar, Flash::info("You have been logged out."));
    (jar, Redirect::to("/login"))
}

/// `GET /register`
pub async fn register_page(
    user: Option<AuthenticatedUser>,
    State(service): State<Arc<AuthService>>,
    jar: CookieJar,
) -> PageResult<Response> {
    if let Some(user) = user {
        return Ok(Redirect::to(user.home_path()).into_response());
    }

    let (jar, flash) = take_flash(jar);
    let html = render_register(
        &service,
        &RegisterForm::default(),
        &RegisterErrors::default(),
        flash,
    )
    .await?;

    Ok((jar, html).into_response())
}

/// `POST /register`
pub async fn register(
    State(service): State<Arc<AuthService>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> PageResult<Response> {
    match service.register(&form).await? {
        RegisterOutcome::Created(user) => {
            tracing::info!("User registered: id={}, username={}", user.id, user.username);
            let jar = set_flash(
                jar,
                Flash::success("Account created successfully! You can now log in."),
            );
            Ok((jar, Redirect::to("/login")).into_response())
        }
        RegisterOutcome::Invalid(errors) => Ok(render_register(&service, &form, &errors, None)
            .await?
            .into_response()),
    }
}

async fn render_register(
    service: &AuthService,
    form: &RegisterForm,
    errors: &RegisterErrors,
    flash: Option<Flash>,
) -> Result<Html<String>> {
    let departments = service.departments().list().await?;
    let notice = departments.is_empty().then_some(NO_DEPARTMENTS_MESSAGE);

    render_page(
        "register.html",
        context! {
            current_user => None::<AuthenticatedUser>,
            flash => flash,
            username => form.username.trim(),
            email => form.email.trim(),
            selected_department => form.department_id.trim(),
            departments => departments,
            no_departments => notice,
            errors => errors,
        },
    )
}

/// Get the signed-in user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user retrieved successfully", body = ApiResponse<MeResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(
        ("session_cookie" = [])
    )
)]
pub async fn get_me(user: AuthenticatedUser) -> Json<ApiResponse<MeResponseDto>> {
    Json(ApiResponse::success(Some(user.into()), None, None))
}
