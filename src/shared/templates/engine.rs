//! Template engine for server-rendered pages using Jinja2 syntax.
//!
//! Templates are embedded at compile time and registered once in a global
//! environment. Names ending in `.html` get HTML auto-escaping.

use axum::http::StatusCode;
use axum::response::Html;
use chrono::{DateTime, NaiveDateTime};
use minijinja::{context, Environment};
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

use crate::core::error::AppError;

/// Global template environment
static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

macro_rules! page_template {
    ($name:literal) => {
        ($name, include_str!(concat!("../../../templates/pages/", $name)))
    };
}

const TEMPLATES: &[(&str, &str)] = &[
    page_template!("base.html"),
    page_template!("error.html"),
    page_template!("login.html"),
    page_template!("register.html"),
    page_template!("dashboard.html"),
    page_template!("admin/dashboard.html"),
    page_template!("admin/file_rows.html"),
    page_template!("admin/pagination.html"),
    page_template!("admin/departments.html"),
    page_template!("admin/department_files.html"),
    page_template!("admin/users.html"),
    page_template!("admin/edit_user.html"),
    page_template!("admin/edit_file.html"),
];

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

impl From<TemplateError> for AppError {
    fn from(err: TemplateError) -> Self {
        AppError::Internal(err.to_string())
    }
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();

    for &(name, source) in TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load template {}: {}", name, e);
        } else {
            tracing::debug!("Loaded template: {}", name);
        }
    }

    env.add_filter("datetime", format_datetime);
    env.add_filter("filesize", format_filesize);

    env
}

/// Get the global template environment
fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Render a template with the given context.
///
/// # Example
/// ```ignore
/// let html = render_template("login.html", minijinja::context! { username => "alice" })?;
/// ```
pub fn render_template<S: Serialize>(template_name: &str, ctx: S) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    template.render(ctx).map_err(|e| {
        tracing::error!("Failed to render template {}: {:#}", template_name, e);
        TemplateError::RenderError(e.to_string())
    })
}

/// Render a full page
pub fn render_page<S: Serialize>(template_name: &str, ctx: S) -> Result<Html<String>, AppError> {
    Ok(Html(render_template(template_name, ctx)?))
}

/// Render the error page, falling back to plain text if that fails too
pub fn render_error_page(status: StatusCode, message: &str) -> Html<String> {
    let ctx = context! {
        status => status.as_u16(),
        reason => status.canonical_reason().unwrap_or("Error"),
        message => message,
    };

    match render_template("error.html", ctx) {
        Ok(html) => Html(html),
        Err(_) => Html(format!("{}: {}", status.as_u16(), message)),
    }
}

/// `datetime` filter: "YYYY-MM-DD HH:MM:SS", or "N/A" when there is no value
fn format_datetime(value: Option<String>) -> String {
    let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
        return "N/A".to_string();
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S") {
        return naive.format("%Y-%m-%d %H:%M:%S").to_string();
    }

    raw
}

/// `filesize` filter: human readable byte count
fn format_filesize(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes.max(0));
    }

    let mut size = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if size < 1024.0 {
            break;
        }
        size /= 1024.0;
        unit = next;
    }

    format!("{:.1} {}", size, unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_datetime() {
        assert_eq!(
            format_datetime(Some("2025-03-04T05:06:07.123+00:00".to_string())),
            "2025-03-04 05:06:07"
        );
        assert_eq!(
            format_datetime(Some("2025-03-04 05:06:07".to_string())),
            "2025-03-04 05:06:07"
        );
        assert_eq!(format_datetime(None), "N/A");
        assert_eq!(format_datetime(Some("  ".to_string())), "N/A");
        assert_eq!(format_datetime(Some("yesterday".to_string())), "yesterday");
    }

    #[test]
    fn test_format_filesize() {
        assert_eq!(format_filesize(0), "0 B");
        assert_eq!(format_filesize(1023), "1023 B");
        assert_eq!(format_filesize(1536), "1.5 KB");
        assert_eq!(format_filesize(20_000_000), "19.1 MB");
    }

    #[test]
    fn test_all_templates_load() {
        for (name, _) in TEMPLATES {
            assert!(
                get_environment().get_template(name).is_ok(),
                "template {} failed to load",
                name
            );
        }
    }

    #[test]
    fn test_html_is_escaped() {
        let html = render_error_page(StatusCode::NOT_FOUND, "<script>alert(1)</script>");
        assert!(!html.0.contains("<script>alert(1)</script>"));
        assert!(html.0.contains("&lt;script&gt;"));
    }
}
