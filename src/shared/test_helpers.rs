//! Fixtures shared by unit and HTTP tests.
//!
//! Every pool is a private in-memory SQLite database with migrations applied.
//! It holds exactly one connection, so tests must not use the pool while a
//! transaction is open.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crate::core::config::{
    AppConfig, Config, DatabaseConfig, SessionConfig, StorageConfig, SwaggerConfig,
};
use crate::core::database::run_migrations;
use crate::features::auth::{AuthService, SessionManager};
use crate::features::departments::DepartmentService;
use crate::features::files::FileService;
use crate::features::users::UserService;
use crate::modules::storage::LocalStorage;
use crate::shared::constants::DEFAULT_ALLOWED_EXTENSIONS;

/// Hash that parses as a PHC string but matches no password
pub const UNUSABLE_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    run_migrations(&pool).await.unwrap();
    pool
}

pub async fn create_test_department(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO departments (name) VALUES (?) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Insert a user that cannot log in; `role` is "admin" or "user"
pub async fn create_test_user(
    pool: &SqlitePool,
    username: &str,
    role: &str,
    department_id: Option<i64>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (username, email, password_hash, role, department_id)
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(username)
    .bind(format!("{}@example.com", username))
    .bind(UNUSABLE_PASSWORD_HASH)
    .bind(role)
    .bind(department_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub fn test_session_config() -> SessionConfig {
    SessionConfig {
        secret: "test-secret-test-secret-test-secret".to_string(),
        ttl: Duration::from_secs(3600),
        cookie_secure: false,
    }
}

/// Upload settings rooted in `dir`: default extensions, 1MB per file
pub fn test_storage_config(dir: &TempDir) -> StorageConfig {
    StorageConfig {
        upload_dir: dir.path().join("uploads"),
        max_file_size: 1_000_000,
        allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

/// File service over a fresh upload directory; keep the `TempDir` alive
pub async fn test_file_service(pool: SqlitePool) -> (FileService, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = test_storage_config(&dir);
    let storage = Arc::new(LocalStorage::new(&config).await.unwrap());

    (FileService::new(pool, storage, &config), dir)
}

/// Auth service with the user and department services it needs
pub async fn test_auth_service(pool: SqlitePool) -> (AuthService, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = test_storage_config(&dir);
    let storage = Arc::new(LocalStorage::new(&config).await.unwrap());
    let departments = Arc::new(DepartmentService::new(pool.clone()));
    let users = Arc::new(UserService::new(pool, storage, Arc::clone(&departments)));
    let sessions = Arc::new(SessionManager::new(&test_session_config()));

    (AuthService::new(users, departments, sessions), dir)
}

/// Complete configuration for router tests, storing uploads in `dir`
pub fn test_config(dir: &TempDir) -> Config {
    Config {
        app: AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_request_body_size: 10 * 1024 * 1024,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        },
        session: test_session_config(),
        storage: test_storage_config(dir),
        admin: None,
        swagger: SwaggerConfig {
            username: None,
            password: None,
            title: "Dept Storage API".to_string(),
            version: "0.1.0".to_string(),
            description: "test".to_string(),
        },
    }
}
