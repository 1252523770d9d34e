use std::sync::Arc;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::dashboard::dtos::{AdminDashboard, AdminFilesPage, UserDashboard};
use crate::features::departments::DepartmentService;
use crate::features::files::FileService;
use crate::shared::constants::ADMIN_FILES_PER_PAGE;
use crate::shared::types::Pagination;

/// Read-only queries behind the dashboard pages
pub struct DashboardService {
    files: Arc<FileService>,
    departments: Arc<DepartmentService>,
}

impl DashboardService {
    pub fn new(files: Arc<FileService>, departments: Arc<DepartmentService>) -> Self {
        Self { files, departments }
    }

    pub fn files(&self) -> &FileService {
        &self.files
    }

    pub async fn user_dashboard(&self, user: &AuthenticatedUser) -> Result<UserDashboard> {
        let department_name = match user.department_id {
            Some(id) => self
                .departments
                .find_by_id(id)
                .await?
                .map(|d| d.name)
                .unwrap_or_else(|| "N/A".to_string()),
            None => "N/A".to_string(),
        };

        let files = self.files.list_for_user(user.id).await?;

        Ok(UserDashboard {
            department_name,
            files,
        })
    }

    /// A page of all files, newest first.
    ///
    /// Pages past the end are clamped to the last page.
    pub async fn admin_files_page(&self, page: i64) -> Result<AdminFilesPage> {
        let pagination = Pagination::new(page, ADMIN_FILES_PER_PAGE);
        let (mut files, total) = self.files.list_all_paginated(pagination).await?;
        let total_pages = pagination.total_pages(total);

        let last_page = total_pages.max(1);
        let mut current_page = pagination.page;
        if current_page > last_page {
            current_page = last_page;
            if total > 0 {
                let last = Pagination::new(current_page, ADMIN_FILES_PER_PAGE);
                files = self.files.list_all_paginated(last).await?.0;
            }
        }

        Ok(AdminFilesPage {
            files,
            current_page,
            total_pages,
            total,
        })
    }

    pub async fn admin_dashboard(&self, page: i64) -> Result<AdminDashboard> {
        let page = self.admin_files_page(page).await?;
        let departments = self.departments.list().await?;

        Ok(AdminDashboard { page, departments })
    }
}
