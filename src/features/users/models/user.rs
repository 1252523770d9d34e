use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::features::auth::model::{AuthenticatedUser, Role};

/// Database model for users
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub department_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }

    pub fn to_authenticated(&self) -> AuthenticatedUser {
        AuthenticatedUser {
            id: self.id,
            username: self.username.clone(),
            role: self.role(),
            department_id: self.department_id,
        }
    }
}

/// User row joined with its department name, for admin listings
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserWithDepartment {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Values for a new user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub department_id: Option<i64>,
}
