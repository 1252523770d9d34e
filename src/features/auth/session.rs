//! Signed session tokens carried in the `dept_session` cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::config::SessionConfig;
use crate::core::error::AppError;
use crate::features::auth::model::{AuthenticatedUser, Role};
use crate::shared::constants::SESSION_COOKIE_NAME;

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    username: String,
    role: Role,
    #[serde(default)]
    department_id: Option<i64>,
    iat: i64,
    exp: i64,
}

/// Issues and verifies HS256 session tokens
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    cookie_secure: bool,
}

impl SessionManager {
    pub fn new(config: &SessionConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl: config.ttl,
            cookie_secure: config.cookie_secure,
        }
    }

    /// Create a signed token for the user
    pub fn issue(&self, user: &AuthenticatedUser) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            department_id: user.department_id,
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
    }

    /// Check signature and expiry and return the user the token was issued for
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid session: {}", e)))?;

        let claims = data.claims;
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthorized("Invalid session subject".to_string()))?;

        Ok(AuthenticatedUser {
            id,
            username: claims.username,
            role: claims.role,
            department_id: claims.department_id,
        })
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .max_age(time::Duration::seconds(self.ttl.as_secs() as i64))
            .build()
    }

    /// Removal cookie for logout; path must match the one the cookie was set with
    pub fn clear_cookie(&self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE_NAME).path("/").build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(ttl_secs: u64) -> SessionManager {
        SessionManager::new(&SessionConfig {
            secret: "0123456789abcdef0123456789abcdef".to_string(),
            ttl: Duration::from_secs(ttl_secs),
            cookie_secure: false,
        })
    }

    fn alice() -> AuthenticatedUser {
        AuthenticatedUser {
            id: 7,
            username: "alice".to_string(),
            role: Role::User,
            department_id: Some(3),
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let sessions = manager(60);
        let token = sessions.issue(&alice()).unwrap();
        let user = sessions.verify(&token).unwrap();

        assert_eq!(user.id, 7);
        assert_eq!(user.username, "alice");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.department_id, Some(3));
    }

    #[test]
    fn test_verify_rejects_other_secret() {
        let token = manager(60).issue(&alice()).unwrap();
        let other = SessionManager::new(&SessionConfig {
            secret: "ffffffffffffffffffffffffffffffff".to_string(),
            ttl: Duration::from_secs(60),
            cookie_secure: false,
        });

        assert!(matches!(
            other.verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let sessions = manager(0);
        let token = sessions.issue(&alice()).unwrap();
        std::thread::sleep(Duration::from_millis(1100));

        assert!(sessions.verify(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(manager(60).verify("not.a.token").is_err());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = manager(60).session_cookie("abc".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }
}
