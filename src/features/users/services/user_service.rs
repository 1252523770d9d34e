use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::error::{AppError, Result};
use crate::features::departments::DepartmentService;
use crate::features::users::dtos::{DepartmentSelection, EditUserErrors, EditUserForm};
use crate::features::users::models::{NewUser, User, UserWithDepartment};
use crate::modules::storage::LocalStorage;
use crate::shared::constants::ROLE_ADMIN;
use crate::shared::validation::USERNAME_REGEX;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, department_id, created_at";

/// Outcome of an admin edit
#[derive(Debug)]
pub enum EditUserOutcome {
    Updated(User),
    Invalid(EditUserErrors),
}

/// A removed user and how many files went with them
#[derive(Debug)]
pub struct DeletedUser {
    pub username: String,
    pub files_deleted: usize,
}

/// Service for user accounts
pub struct UserService {
    pool: SqlitePool,
    storage: Arc<LocalStorage>,
    departments: Arc<DepartmentService>,
}

impl UserService {
    pub fn new(
        pool: SqlitePool,
        storage: Arc<LocalStorage>,
        departments: Arc<DepartmentService>,
    ) -> Self {
        Self {
            pool,
            storage,
            departments,
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Whether another account already uses the username
    pub async fn username_taken(&self, username: &str, except_id: Option<i64>) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE username = ? AND id != ?")
                .bind(username)
                .bind(except_id.unwrap_or(0))
                .fetch_optional(&self.pool)
                .await?;

        Ok(found.is_some())
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Insert a user. Input is expected to be validated already.
    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, password_hash, role, department_id)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(new_user.role.as_str())
            .bind(new_user.department_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::Conflict("Username or email is already registered.".to_string())
                }
                other => AppError::Database(other),
            })?;

        info!("User created: id={}, username={}, role={}", user.id, user.username, user.role);

        Ok(user)
    }

    /// Non-admin users with their department names, by username
    pub async fn list_non_admin(&self) -> Result<Vec<UserWithDepartment>> {
        let users = sqlx::query_as::<_, UserWithDepartment>(
            r#"
            SELECT u.id, u.username, u.email, u.role, u.department_id,
                   d.name AS department_name, u.created_at
            FROM users u
            LEFT JOIN departments d ON d.id = u.department_id
            WHERE u.role != ?
            ORDER BY u.username ASC
            "#,
        )
        .bind(ROLE_ADMIN)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Apply an admin edit of username and department
    pub async fn update(&self, id: i64, form: EditUserForm) -> Result<EditUserOutcome> {
        if self.find_by_id(id).await?.is_none() {
            return Err(AppError::NotFound("User not found.".to_string()));
        }

        let mut errors = EditUserErrors::default();

        let username = form.username.trim().to_string();
        if username.is_empty() {
            errors.username = Some("Please enter a username.".to_string());
        } else if !USERNAME_REGEX.is_match(&username) {
            errors.username =
                Some("Username can only contain letters, numbers, and underscores.".to_string());
        } else if self.username_taken(&username, Some(id)).await? {
            errors.username = Some("This username is already taken.".to_string());
        }

        let department_id = match DepartmentSelection::parse(&form.department_id) {
            DepartmentSelection::Unassigned => None,
            DepartmentSelection::Department(dept_id) => {
                if !self.departments.exists(dept_id).await? {
                    errors.department = Some("Invalid department selected.".to_string());
                }
                Some(dept_id)
            }
            DepartmentSelection::Invalid => {
                errors.department = Some("Invalid department selected.".to_string());
                None
            }
        };

        if !errors.is_empty() {
            return Ok(EditUserOutcome::Invalid(errors));
        }

        let sql = format!(
            "UPDATE users SET username = ?, department_id = ? WHERE id = ? RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&username)
            .bind(department_id)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        info!("User updated: id={}, username={}", user.id, user.username);

        Ok(EditUserOutcome::Updated(user))
    }

    /// Delete a non-admin user together with their files.
    ///
    /// Rows go in one transaction; stored objects are removed afterwards.
    pub async fn delete(&self, id: i64) -> Result<DeletedUser> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

        if user.role == ROLE_ADMIN {
            return Err(AppError::Forbidden(
                "Cannot delete an administrator account.".to_string(),
            ));
        }

        let keys: Vec<String> =
            sqlx::query_scalar("SELECT filepath FROM files WHERE uploaded_by = ?")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM files WHERE uploaded_by = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        for key in &keys {
            match self.storage.delete(key).await {
                Ok(true) => {}
                Ok(false) => warn!(
                    "Stored object '{}' of deleted user {} was already gone",
                    key, id
                ),
                Err(e) => warn!(
                    "Failed to remove stored object '{}' of deleted user {}: {}",
                    key, id, e
                ),
            }
        }

        info!(
            "User deleted: id={}, username={}, files={}",
            user.id,
            user.username,
            keys.len()
        );

        Ok(DeletedUser {
            username: user.username,
            files_deleted: keys.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StorageConfig;
    use crate::features::auth::model::Role;
    use crate::shared::test_helpers::{create_test_department, create_test_user, test_pool};
    use tempfile::TempDir;

    async fn service() -> (UserService, Arc<LocalStorage>, SqlitePool, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            upload_dir: dir.path().to_path_buf(),
            max_file_size: 1_000,
            allowed_extensions: vec!["txt".to_string()],
        };
        let pool = test_pool().await;
        let storage = Arc::new(LocalStorage::new(&config).await.unwrap());
        let departments = Arc::new(DepartmentService::new(pool.clone()));
        let service = UserService::new(pool.clone(), Arc::clone(&storage), departments);
        (service, storage, pool, dir)
    }

    fn errors(outcome: EditUserOutcome) -> EditUserErrors {
        match outcome {
            EditUserOutcome::Invalid(errors) => errors,
            EditUserOutcome::Updated(user) => panic!("unexpected update of {}", user.username),
        }
    }

    fn edit(username: &str, department_id: &str) -> EditUserForm {
        EditUserForm {
            username: username.to_string(),
            department_id: department_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (service, _, _, _dir) = service().await;
        let user = service
            .create(NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
                department_id: None,
            })
            .await
            .unwrap();

        assert_eq!(user.role(), Role::User);
        assert!(service.find_by_username("ALICE").await.unwrap().is_some());
        assert!(service.email_taken("Alice@Example.com").await.unwrap());
        assert!(service.username_taken("alice", None).await.unwrap());
        assert!(!service.username_taken("alice", Some(user.id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_non_admin_sorted() {
        let (service, _, pool, _dir) = service().await;
        let it = create_test_department(&pool, "IT").await;
        create_test_user(&pool, "zed", "user", Some(it)).await;
        create_test_user(&pool, "amy", "user", None).await;
        create_test_user(&pool, "root", "admin", None).await;

        let users = service.list_non_admin().await.unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["amy", "zed"]);
        assert_eq!(users[1].department_name.as_deref(), Some("IT"));
    }

    #[tokio::test]
    async fn test_update_validates_fields() {
        let (service, _, pool, _dir) = service().await;
        let id = create_test_user(&pool, "alice", "user", None).await;
        create_test_user(&pool, "bob", "user", None).await;

        let e = errors(service.update(id, edit("  ", "")).await.unwrap());
        assert_eq!(e.username.as_deref(), Some("Please enter a username."));

        let e = errors(service.update(id, edit("bad name", "")).await.unwrap());
        assert_eq!(
            e.username.as_deref(),
            Some("Username can only contain letters, numbers, and underscores.")
        );

        let e = errors(service.update(id, edit("bob", "")).await.unwrap());
        assert_eq!(e.username.as_deref(), Some("This username is already taken."));

        let e = errors(service.update(id, edit("alice", "999")).await.unwrap());
        assert_eq!(e.department.as_deref(), Some("Invalid department selected."));
    }

    #[tokio::test]
    async fn test_update_changes_username_and_department() {
        let (service, _, pool, _dir) = service().await;
        let it = create_test_department(&pool, "IT").await;
        let id = create_test_user(&pool, "alice", "user", Some(it)).await;

        let outcome = service.update(id, edit("alice2", "")).await.unwrap();
        match outcome {
            EditUserOutcome::Updated(user) => {
                assert_eq!(user.username, "alice2");
                assert_eq!(user.department_id, None);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let outcome = service
            .update(id, edit("alice2", &it.to_string()))
            .await
            .unwrap();
        let EditUserOutcome::Updated(updated) = outcome else {
            panic!("update should succeed");
        };
        assert_eq!(updated.department_id, Some(it));

        assert!(matches!(
            service.update(999, edit("x", "")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_refuses_admin() {
        let (service, _, pool, _dir) = service().await;
        let admin = create_test_user(&pool, "root", "admin", None).await;

        assert!(matches!(
            service.delete(admin).await,
            Err(AppError::Forbidden(msg)) if msg == "Cannot delete an administrator account."
        ));
        assert!(service.find_by_id(admin).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_user_files_and_objects() {
        let (service, storage, pool, _dir) = service().await;
        let id = create_test_user(&pool, "alice", "user", None).await;

        for key in ["file_one.txt", "file_two.txt"] {
            storage.upload(key, b"data").await.unwrap();
            sqlx::query(
                "INSERT INTO files (filename, filepath, size, uploaded_by)
                 VALUES ('a.txt', ?, 4, ?)",
            )
            .bind(key)
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
        }

        let deleted = service.delete(id).await.unwrap();
        assert_eq!(deleted.username, "alice");
        assert_eq!(deleted.files_deleted, 2);
        assert!(service.find_by_id(id).await.unwrap().is_none());
        assert!(!storage.exists("file_one.txt").await.unwrap());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
