use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Database model for files
#[derive(Debug, Clone, FromRow)]
pub struct File {
    pub id: i64,
    /// Display name as uploaded
    pub filename: String,
    /// Key of the stored object inside the upload directory
    pub filepath: String,
    pub size: i64,
    pub uploaded_by: i64,
    pub department_id: Option<i64>,
    pub upload_date: DateTime<Utc>,
}

/// File row joined with its uploader and department, for listings
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FileWithOwner {
    pub id: i64,
    pub filename: String,
    pub size: i64,
    pub uploaded_by: i64,
    pub uploader: String,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub upload_date: DateTime<Utc>,
}
