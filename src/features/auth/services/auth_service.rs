use std::sync::Arc;
use tracing::{error, info, warn};
use validator::ValidateEmail;

use crate::core::config::AdminBootstrapConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{LoginErrors, LoginForm, RegisterErrors, RegisterForm};
use crate::features::auth::model::{AuthenticatedUser, Role};
use crate::features::auth::password::{hash_password, verify_password, PasswordError};
use crate::features::auth::session::SessionManager;
use crate::features::departments::DepartmentService;
use crate::features::users::dtos::DepartmentSelection;
use crate::features::users::models::{NewUser, User};
use crate::features::users::UserService;
use crate::shared::constants::MIN_PASSWORD_LEN;
use crate::shared::validation::USERNAME_REGEX;

/// Result of a login attempt
#[derive(Debug)]
pub enum LoginOutcome {
    Success {
        user: AuthenticatedUser,
        token: String,
    },
    Invalid(LoginErrors),
}

/// Result of a registration attempt
#[derive(Debug)]
pub enum RegisterOutcome {
    Created(User),
    Invalid(RegisterErrors),
}

/// Service for authentication operations (login, registration, sessions)
pub struct AuthService {
    users: Arc<UserService>,
    departments: Arc<DepartmentService>,
    sessions: Arc<SessionManager>,
}

impl AuthService {
    pub fn new(
        users: Arc<UserService>,
        departments: Arc<DepartmentService>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            users,
            departments,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn departments(&self) -> &DepartmentService {
        &self.departments
    }

    /// Check credentials and issue a session token.
    ///
    /// Unknown usernames and wrong passwords produce the same error.
    pub async fn login(&self, form: &LoginForm) -> Result<LoginOutcome> {
        let username = form.username.trim();
        let password = form.password.trim();

        let mut errors = LoginErrors::default();
        if username.is_empty() {
            errors.username = Some("Please enter username.".to_string());
        }
        if password.is_empty() {
            errors.password = Some("Please enter your password.".to_string());
        }
        if !errors.is_empty() {
            return Ok(LoginOutcome::Invalid(errors));
        }

        let invalid = || {
            LoginOutcome::Invalid(LoginErrors {
                login: Some("Invalid username or password.".to_string()),
                ..LoginErrors::default()
            })
        };

        let Some(user) = self.users.find_by_username(username).await? else {
            info!("Login failed: unknown username '{}'", username);
            return Ok(invalid());
        };

        let matches = verify_blocking(password.to_string(), user.password_hash.clone()).await;
        match matches {
            Ok(true) => {}
            Ok(false) => {
                info!("Login failed: wrong password for '{}'", user.username);
                return Ok(invalid());
            }
            Err(e) => {
                error!("Stored password hash for user {} is unusable: {}", user.id, e);
                return Ok(invalid());
            }
        }

        let authenticated = user.to_authenticated();
        let token = self.sessions.issue(&authenticated)?;

        info!(
            "User logged in: id={}, username={}, role={}",
            authenticated.id,
            authenticated.username,
            authenticated.role.as_str()
        );

        Ok(LoginOutcome::Success {
            user: authenticated,
            token,
        })
    }

    /// Validate the registration form and create an ordinary user
    pub async fn register(&self, form: &RegisterForm) -> Result<RegisterOutcome> {
        let mut errors = RegisterErrors::default();

        let username = form.username.trim();
        if username.is_empty() {
            errors.username = Some("Please enter a username.".to_string());
        } else if !USERNAME_REGEX.is_match(username) {
            errors.username =
                Some("Username can only contain letters, numbers, and underscores.".to_string());
        } else if self.users.username_taken(username, None).await? {
            errors.username = Some("This username is already taken.".to_string());
        }

        let email = form.email.trim();
        if email.is_empty() {
            errors.email = Some("Please enter an email.".to_string());
        } else if !email.validate_email() {
            errors.email = Some("Please enter a valid email address.".to_string());
        } else if self.users.email_taken(email).await? {
            errors.email = Some("This email is already registered.".to_string());
        }

        let password = form.password.trim();
        if password.is_empty() {
            errors.password = Some("Please enter a password.".to_string());
        } else if password.chars().count() < MIN_PASSWORD_LEN {
            errors.password = Some(format!(
                "Password must have at least {} characters.",
                MIN_PASSWORD_LEN
            ));
        }

        let confirm_password = form.confirm_password.trim();
        if confirm_password.is_empty() {
            errors.confirm_password = Some("Please confirm password.".to_string());
        } else if errors.password.is_none() && password != confirm_password {
            errors.confirm_password = Some("Password did not match.".to_string());
        }

        let department_id = match DepartmentSelection::parse(&form.department_id) {
            DepartmentSelection::Unassigned => {
                errors.department = Some("Please select a department.".to_string());
                None
            }
            DepartmentSelection::Department(id) => {
                if !self.departments.exists(id).await? {
                    errors.department = Some("Invalid department selected.".to_string());
                }
                Some(id)
            }
            DepartmentSelection::Invalid => {
                errors.department = Some("Invalid department selected.".to_string());
                None
            }
        };

        if !errors.is_empty() {
            return Ok(RegisterOutcome::Invalid(errors));
        }

        let password_hash = hash_blocking(password.to_string()).await?;
        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role: Role::User,
                department_id,
            })
            .await?;

        Ok(RegisterOutcome::Created(user))
    }

    /// Resolve a session cookie to the current state of its user.
    ///
    /// Returns `None` for bad or expired tokens and for users that no longer exist.
    pub async fn resolve_session(&self, token: &str) -> Option<AuthenticatedUser> {
        let claimed = self.sessions.verify(token).ok()?;

        match self.users.find_by_id(claimed.id).await {
            Ok(Some(user)) => Some(user.to_authenticated()),
            Ok(None) => {
                warn!("Session for deleted user {} ignored", claimed.id);
                None
            }
            Err(e) => {
                error!("Failed to load session user {}: {}", claimed.id, e);
                None
            }
        }
    }

    /// Create the configured administrator unless that username already exists.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, config: &AdminBootstrapConfig) -> Result<bool> {
        if let Some(existing) = self.users.find_by_username(&config.username).await? {
            if existing.role() != Role::Admin {
                warn!(
                    "Bootstrap admin username '{}' belongs to a non-admin account",
                    existing.username
                );
            }
            return Ok(false);
        }

        let password_hash = hash_blocking(config.password.clone()).await?;
        self.users
            .create(NewUser {
                username: config.username.clone(),
                email: config.email.clone(),
                password_hash,
                role: Role::Admin,
                department_id: None,
            })
            .await?;

        info!("Bootstrap administrator '{}' created", config.username);
        Ok(true)
    }
}

async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(e.to_string()))
}

async fn verify_blocking(
    password: String,
    hash: String,
) -> std::result::Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::VerifyError(e.to_string()))?
}
