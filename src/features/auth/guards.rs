//! Authorization guards.
//!
//! The session middleware puts the signed-in user into request extensions;
//! these extractors read it back and check the role.
//!
//! - [`RequireAdmin`] is for JSON endpoints and rejects with an [`AppError`].
//! - [`SessionUser`] and [`SessionAdmin`] are for HTML pages and send the
//!   browser to the login page instead.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts, response::Redirect};

/// Guard for JSON endpoints reserved to administrators.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(user): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(RequireAdmin(user.clone()))
    }
}

/// Any signed-in user, for HTML pages
pub struct SessionUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(SessionUser)
            .ok_or_else(|| Redirect::to("/login"))
    }
}

/// Signed-in administrator, for HTML pages. Everyone else goes to the login page.
pub struct SessionAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for SessionAdmin
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthenticatedUser>() {
            Some(user) if user.is_admin() => Ok(SessionAdmin(user.clone())),
            Some(user) => {
                tracing::warn!(
                    "User '{}' denied access to admin page {}",
                    user.username,
                    parts.uri.path()
                );
                Err(Redirect::to("/login"))
            }
            None => Err(Redirect::to("/login")),
        }
    }
}
