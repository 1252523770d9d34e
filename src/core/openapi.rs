use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth::{dtos as auth_dtos, handlers as auth_handlers, model as auth_model};
use crate::features::dashboard::handlers as dashboard_handlers;
use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::shared::constants::SESSION_COOKIE_NAME;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth_handlers::login,
        auth_handlers::get_me,
        // Files
        files_handlers::upload_files,
        files_handlers::delete_file,
        // Admin dashboard
        dashboard_handlers::list_admin_files,
    ),
    components(
        schemas(
            // Shared
            ApiResponse<String>,
            Meta,
            // Auth
            auth_model::Role,
            auth_dtos::LoginForm,
            auth_dtos::LoginErrors,
            auth_dtos::LoginResponseDto,
            auth_dtos::MeResponseDto,
            ApiResponse<auth_dtos::MeResponseDto>,
            // Files
            files_dtos::UploadFilesDto,
            files_dtos::FileResponseDto,
            files_dtos::StoredFileDto,
            files_dtos::UploadResultDto,
            files_dtos::DeleteFileResponseDto,
            files_dtos::AdminFilePageDto,
            ApiResponse<files_dtos::UploadResultDto>,
            ApiResponse<files_dtos::DeleteFileResponseDto>,
            ApiResponse<files_dtos::AdminFilePageDto>,
        )
    ),
    tags(
        (name = "auth", description = "Session login"),
        (name = "files", description = "File upload and deletion"),
        (name = "admin", description = "Administrator file listing"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

/// Adds the session cookie security scheme to the OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE_NAME))),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_json_endpoints() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in ["/api/files/upload", "/api/files/{id}", "/api/admin/files", "/login"] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing path {}",
                expected
            );
        }

        let schemes = doc.components.as_ref().map(|c| c.security_schemes.len());
        assert_eq!(schemes, Some(1));
    }

    #[test]
    fn test_openapi_registers_response_envelopes() {
        let doc = ApiDoc::openapi();
        let schemas = doc
            .components
            .as_ref()
            .map(|c| c.schemas.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();

        assert!(schemas.iter().any(|s| s == "Meta"));
        assert!(schemas.iter().any(|s| s.starts_with("ApiResponse")));
        assert!(schemas.iter().any(|s| s == "MeResponseDto"));
    }

    #[test]
    fn test_swagger_info_modifier() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Docs".to_string(),
            version: "9.9.9".to_string(),
            description: "desc".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Docs");
        assert_eq!(doc.info.version, "9.9.9");
    }
}
