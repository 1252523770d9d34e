use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Database model for departments
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Department with the number of users and files referencing it
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DepartmentWithCounts {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub user_count: i64,
    pub file_count: i64,
}
