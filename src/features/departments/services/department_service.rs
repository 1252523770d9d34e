use sqlx::SqlitePool;
use tracing::info;

use crate::core::error::{AppError, Result};
use crate::features::departments::models::{Department, DepartmentWithCounts};

/// Service for department operations
pub struct DepartmentService {
    pool: SqlitePool,
}

impl DepartmentService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All departments, alphabetical
    pub async fn list(&self) -> Result<Vec<Department>> {
        let departments = sqlx::query_as::<_, Department>(
            "SELECT id, name, created_at FROM departments ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(departments)
    }

    /// All departments with how many users and files reference each
    pub async fn list_with_counts(&self) -> Result<Vec<DepartmentWithCounts>> {
        let departments = sqlx::query_as::<_, DepartmentWithCounts>(
            r#"
            SELECT d.id, d.name, d.created_at,
                   (SELECT COUNT(*) FROM users u WHERE u.department_id = d.id) AS user_count,
                   (SELECT COUNT(*) FROM files f WHERE f.department_id = d.id) AS file_count
            FROM departments d
            ORDER BY d.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(departments)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Department>> {
        let department = sqlx::query_as::<_, Department>(
            "SELECT id, name, created_at FROM departments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(department)
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// Create a department. The name is trimmed and compared case-insensitively.
    pub async fn create(&self, name: &str) -> Result<Department> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "Department name cannot be empty.".to_string(),
            ));
        }

        let duplicate = || AppError::Conflict(format!("Department '{}' already exists.", name));

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM departments WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(duplicate());
        }

        let department = sqlx::query_as::<_, Department>(
            "INSERT INTO departments (name) VALUES (?) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => duplicate(),
            other => AppError::Database(other),
        })?;

        info!("Department created: id={}, name={}", department.id, department.name);

        Ok(department)
    }

    /// Delete a department that no user or file references.
    ///
    /// Returns the deleted department so callers can name it.
    pub async fn delete(&self, id: i64) -> Result<Department> {
        let mut tx = self.pool.begin().await?;

        let department = sqlx::query_as::<_, Department>(
            "SELECT id, name, created_at FROM departments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Department not found.".to_string()))?;

        let user_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE department_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if user_count > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete department. There are {} user(s) still assigned to this department.",
                user_count
            )));
        }

        let file_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE department_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if file_count > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete department. There are {} file(s) associated with this department.",
                file_count
            )));
        }

        sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Department deleted: id={}, name={}", department.id, department.name);

        Ok(department)
    }
}
