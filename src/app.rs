//! Service wiring and the application router.

use axum::{
    http::{header, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::core::config::Config;
use crate::core::middleware;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::auth::{self, AuthService, SessionManager};
use crate::features::dashboard::{self, DashboardService};
use crate::features::departments::{self, DepartmentService, DepartmentState};
use crate::features::files::{self, FileService};
use crate::features::users::{self, UserAdminState, UserService};
use crate::modules::storage::LocalStorage;

const STYLESHEET: &str = include_str!("../static/style.css");

/// Every service the routes need, shared behind `Arc`s
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub departments: Arc<DepartmentService>,
    pub users: Arc<UserService>,
    pub files: Arc<FileService>,
    pub dashboard: Arc<DashboardService>,
}

impl AppServices {
    pub fn new(pool: SqlitePool, storage: Arc<LocalStorage>, config: &Config) -> Self {
        let departments = Arc::new(DepartmentService::new(pool.clone()));
        let users = Arc::new(UserService::new(
            pool.clone(),
            Arc::clone(&storage),
            Arc::clone(&departments),
        ));
        let files = Arc::new(FileService::new(pool, storage, &config.storage));
        let sessions = Arc::new(SessionManager::new(&config.session));
        let auth = Arc::new(AuthService::new(
            Arc::clone(&users),
            Arc::clone(&departments),
            sessions,
        ));
        let dashboard = Arc::new(DashboardService::new(
            Arc::clone(&files),
            Arc::clone(&departments),
        ));

        Self {
            auth,
            departments,
            users,
            files,
            dashboard,
        }
    }
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn stylesheet() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        STYLESHEET,
    )
}

fn swagger_router(config: &Config) -> Router {
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger =
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi));

    match config.swagger.credentials() {
        Some(credentials) => {
            tracing::info!("Swagger UI basic auth enabled");
            swagger.layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
        }
        None => {
            tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
            swagger
        }
    }
}

/// Build the full application router with its middleware stack
pub fn build_router(services: &AppServices, config: &Config) -> Router {
    let body_limit = config.app.max_request_body_size;

    let pages = Router::new()
        .merge(auth::routes(Arc::clone(&services.auth)))
        .merge(dashboard::routes(Arc::clone(&services.dashboard)))
        .merge(files::routes(Arc::clone(&services.files), body_limit))
        .merge(departments::routes(DepartmentState {
            departments: Arc::clone(&services.departments),
            files: Arc::clone(&services.files),
        }))
        .merge(users::routes(UserAdminState {
            users: Arc::clone(&services.users),
            departments: Arc::clone(&services.departments),
        }))
        .layer(from_fn_with_state(
            Arc::clone(&services.auth),
            middleware::session_middleware,
        ));

    Router::new()
        .merge(swagger_router(config))
        .merge(pages)
        .route("/health", get(health_check))
        .route("/static/style.css", get(stylesheet))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
}
