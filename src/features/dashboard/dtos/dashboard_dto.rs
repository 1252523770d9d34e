use serde::Serialize;

use crate::features::departments::models::Department;
use crate::features::files::models::FileWithOwner;

/// Everything the personal dashboard shows
#[derive(Debug, Serialize)]
pub struct UserDashboard {
    /// Department name, or "N/A" for users without one
    pub department_name: String,
    pub files: Vec<FileWithOwner>,
}

/// One page of the admin file table
#[derive(Debug, Serialize)]
pub struct AdminFilesPage {
    pub files: Vec<FileWithOwner>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total: i64,
}

/// Admin dashboard: a page of files plus the department shortcuts
#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    #[serde(flatten)]
    pub page: AdminFilesPage,
    pub departments: Vec<Department>,
}
