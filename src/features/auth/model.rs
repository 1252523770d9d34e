use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_ADMIN, ROLE_USER};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::User => ROLE_USER,
        }
    }

    /// Parse the stored role column. Anything unknown is an ordinary user.
    pub fn parse(value: &str) -> Self {
        if value == ROLE_ADMIN {
            Role::Admin
        } else {
            Role::User
        }
    }
}

/// The signed-in user, as carried by the session cookie and refreshed from the database
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub department_id: Option<i64>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Landing page after login
    pub fn home_path(&self) -> &'static str {
        if self.is_admin() {
            "/admin/dashboard"
        } else {
            "/dashboard"
        }
    }
}
