use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use validator::Validate;

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::RenameFileDto;
use crate::features::files::models::{File, FileWithOwner};
use crate::modules::storage::LocalStorage;
use crate::shared::flash::{Flash, FlashKind};
use crate::shared::types::Pagination;

const FILE_WITH_OWNER_SELECT: &str = r#"
    SELECT f.id, f.filename, f.size, f.uploaded_by, u.username AS uploader,
           f.department_id, d.name AS department_name, f.upload_date
    FROM files f
    JOIN users u ON u.id = f.uploaded_by
    LEFT JOIN departments d ON d.id = f.department_id
"#;

const NEWEST_FIRST: &str = "ORDER BY f.upload_date DESC, f.id DESC";

/// One file part received from an upload form
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Per-file results of an upload request
#[derive(Debug, Default)]
pub struct UploadSummary {
    pub stored: Vec<File>,
    pub errors: Vec<String>,
}

impl UploadSummary {
    /// Nothing was attempted
    pub fn is_empty(&self) -> bool {
        self.stored.is_empty() && self.errors.is_empty()
    }

    /// Message shown after the upload.
    ///
    /// Any failure makes the whole message an error; the success line, when
    /// there is one, comes first.
    pub fn flash(&self) -> Flash {
        if self.is_empty() {
            return Flash::error("No files selected for upload or invalid request.");
        }

        let mut messages = Vec::with_capacity(self.errors.len() + 1);
        match self.stored.len() {
            0 => {}
            1 => messages.push("File uploaded successfully!".to_string()),
            _ => messages.push("Files uploaded successfully!".to_string()),
        }
        messages.extend(self.errors.iter().cloned());

        let kind = if self.errors.is_empty() {
            FlashKind::Success
        } else {
            FlashKind::Error
        };

        Flash::new(kind, messages)
    }
}

/// Result of deleting one file
#[derive(Debug)]
pub struct DeletedFile {
    pub file: File,
    /// False when the stored object was already gone or could not be removed
    pub object_removed: bool,
}

/// Counts from a batch delete
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchDeleteSummary {
    pub deleted: usize,
    pub failed: usize,
}

impl BatchDeleteSummary {
    pub fn flash(&self) -> Flash {
        match (self.deleted, self.failed) {
            (0, 0) => Flash::error("No valid file(s) selected for deletion."),
            (deleted, 0) => Flash::success(format!("Successfully deleted {} file(s).", deleted)),
            (0, failed) => Flash::error(format!("Failed to delete {} file(s).", failed)),
            (deleted, failed) => Flash::error(format!(
                "Deleted {} file(s) with {} failure(s).",
                deleted, failed
            )),
        }
    }
}

/// Service for file operations
pub struct FileService {
    pool: SqlitePool,
    storage: Arc<LocalStorage>,
    max_file_size: usize,
    allowed_extensions: Vec<String>,
}

impl FileService {
    pub fn new(pool: SqlitePool, storage: Arc<LocalStorage>, config: &StorageConfig) -> Self {
        Self {
            pool,
            storage,
            max_file_size: config.max_file_size,
            allowed_extensions: config.allowed_extensions.clone(),
        }
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Upload limit per file in whole megabytes, as shown to users
    pub fn max_file_size_mb(&self) -> usize {
        self.max_file_size / 1_000_000
    }

    /// Validate, store and record every part. One failing file never stops the others.
    pub async fn upload_many(
        &self,
        user: &AuthenticatedUser,
        files: Vec<IncomingFile>,
    ) -> Result<UploadSummary> {
        let mut summary = UploadSummary::default();

        for incoming in files {
            let filename = display_name(&incoming.filename);
            if filename.is_empty() {
                continue;
            }

            match self.store_one(user, &filename, &incoming.data).await {
                Ok(file) => summary.stored.push(file),
                Err(message) => summary.errors.push(message),
            }
        }

        info!(
            "Upload by user {}: stored={}, failed={}",
            user.id,
            summary.stored.len(),
            summary.errors.len()
        );

        Ok(summary)
    }

    /// Store and record one file, or describe why it was refused
    async fn store_one(
        &self,
        user: &AuthenticatedUser,
        filename: &str,
        data: &[u8],
    ) -> std::result::Result<File, String> {
        let extension = lowercase_extension(filename);
        if !self.allowed_extensions.iter().any(|e| *e == extension) {
            return Err(format!(
                "File '{}': Invalid file type. Only {} are allowed.",
                filename,
                self.allowed_extensions
                    .iter()
                    .map(|e| e.to_uppercase())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        if data.len() > self.max_file_size {
            return Err(format!(
                "File '{}' is too large. Maximum {}MB allowed.",
                filename,
                self.max_file_size_mb()
            ));
        }

        let key = self.storage.generate_key(&extension);
        if let Err(e) = self.storage.upload(&key, data).await {
            error!("Failed to store '{}' as '{}': {}", filename, key, e);
            return Err(format!("File '{}': Failed to store file.", filename));
        }

        let inserted = sqlx::query_as::<_, File>(
            r#"
            INSERT INTO files (filename, filepath, size, uploaded_by, department_id)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, filename, filepath, size, uploaded_by, department_id, upload_date
            "#,
        )
        .bind(filename)
        .bind(&key)
        .bind(data.len() as i64)
        .bind(user.id)
        .bind(user.department_id)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(file) => {
                debug!("File recorded: id={}, key={}", file.id, file.filepath);
                Ok(file)
            }
            Err(e) => {
                error!("Failed to record '{}' in database: {:?}", filename, e);
                if let Err(cleanup) = self.storage.delete(&key).await {
                    warn!("Failed to remove orphaned object '{}': {}", key, cleanup);
                }
                Err(format!("File '{}': Error recording in database.", filename))
            }
        }
    }

    /// The user's own files, newest first
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<FileWithOwner>> {
        let sql = format!(
            "{} WHERE f.uploaded_by = ? {}",
            FILE_WITH_OWNER_SELECT, NEWEST_FIRST
        );
        let files = sqlx::query_as::<_, FileWithOwner>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(files)
    }

    /// Files of one department, newest first
    pub async fn list_for_department(&self, department_id: i64) -> Result<Vec<FileWithOwner>> {
        let sql = format!(
            "{} WHERE f.department_id = ? {}",
            FILE_WITH_OWNER_SELECT, NEWEST_FIRST
        );
        let files = sqlx::query_as::<_, FileWithOwner>(&sql)
            .bind(department_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(files)
    }

    /// One page of all files, newest first, with the total row count
    pub async fn list_all_paginated(
        &self,
        pagination: Pagination,
    ) -> Result<(Vec<FileWithOwner>, i64)> {
        let sql = format!("{} {} LIMIT ? OFFSET ?", FILE_WITH_OWNER_SELECT, NEWEST_FIRST);
        let files = sqlx::query_as::<_, FileWithOwner>(&sql)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await?;

        Ok((files, total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<File>> {
        let file = sqlx::query_as::<_, File>(
            r#"
            SELECT id, filename, filepath, size, uploaded_by, department_id, upload_date
            FROM files WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    /// Load a file's bytes for a user allowed to see it.
    ///
    /// Owners, administrators and members of the file's department may download.
    pub async fn download(&self, user: &AuthenticatedUser, id: i64) -> Result<(File, Vec<u8>)> {
        let file = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found.".to_string()))?;

        if !can_view(user, &file) {
            return Err(AppError::Forbidden(
                "You do not have permission to download this file.".to_string(),
            ));
        }

        let data = self.storage.read(&file.filepath).await?;

        Ok((file, data))
    }

    /// Delete a file row and then its stored object.
    ///
    /// Only the owner or an administrator may delete. A stored object that is
    /// already gone does not fail the deletion.
    pub async fn delete(&self, user: &AuthenticatedUser, id: i64) -> Result<DeletedFile> {
        let mut tx = self.pool.begin().await?;

        let file = sqlx::query_as::<_, File>(
            r#"
            SELECT id, filename, filepath, size, uploaded_by, department_id, upload_date
            FROM files WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found.".to_string()))?;

        if !can_modify(user, &file) {
            return Err(AppError::Forbidden(
                "You do not have permission to delete this file.".to_string(),
            ));
        }

        sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let object_removed = match self.storage.delete(&file.filepath).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(
                    "File (ID: {}) deleted from database, but not found on server storage.",
                    file.id
                );
                false
            }
            Err(e) => {
                warn!(
                    "File (ID: {}) deleted from database, but failed to delete from server storage: {}",
                    file.id, e
                );
                false
            }
        };

        info!("File deleted: id={}, by user {}", file.id, user.id);

        Ok(DeletedFile {
            file,
            object_removed,
        })
    }

    /// Delete several files, counting successes and failures
    pub async fn delete_many(&self, user: &AuthenticatedUser, ids: &[i64]) -> BatchDeleteSummary {
        let mut summary = BatchDeleteSummary::default();

        for &id in ids {
            match self.delete(user, id).await {
                Ok(_) => summary.deleted += 1,
                Err(e) => {
                    warn!("Failed to delete file (ID: {}): {}", id, e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    /// Change a file's display name. The stored object keeps its key.
    ///
    /// A new name without an extension keeps the old extension.
    pub async fn rename(&self, id: i64, dto: RenameFileDto) -> Result<File> {
        dto.validate().map_err(|_| {
            AppError::Validation("Invalid file ID or filename provided.".to_string())
        })?;

        let file = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found.".to_string()))?;

        let new_name = display_name(&dto.filename);
        if new_name.is_empty() {
            return Err(AppError::Validation(
                "Invalid file ID or filename provided.".to_string(),
            ));
        }
        let new_name = keep_extension(&file.filename, &new_name);

        let renamed = sqlx::query_as::<_, File>(
            r#"
            UPDATE files SET filename = ? WHERE id = ?
            RETURNING id, filename, filepath, size, uploaded_by, department_id, upload_date
            "#,
        )
        .bind(&new_name)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        info!("File renamed: id={}, '{}' -> '{}'", id, file.filename, renamed.filename);

        Ok(renamed)
    }
}

fn can_modify(user: &AuthenticatedUser, file: &File) -> bool {
    user.is_admin() || file.uploaded_by == user.id
}

fn can_view(user: &AuthenticatedUser, file: &File) -> bool {
    can_modify(user, file)
        || (user.department_id.is_some() && user.department_id == file.department_id)
}

/// Last path component of a client-supplied name, trimmed
fn display_name(raw: &str) -> String {
    raw.rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Text after the last dot, so `.hidden` has the extension `hidden`
fn extension(filename: &str) -> Option<&str> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

fn lowercase_extension(filename: &str) -> String {
    extension(filename).map(str::to_lowercase).unwrap_or_default()
}

fn keep_extension(old_name: &str, new_name: &str) -> String {
    match extension(old_name) {
        Some(ext) if extension(new_name).is_none() => {
            format!("{}.{}", new_name.trim_end_matches('.'), ext)
        }
        _ => new_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::Role;
    use crate::shared::test_helpers::{create_test_department, create_test_user, test_pool};
    use tempfile::TempDir;

    struct Fixture {
        service: FileService,
        storage: Arc<LocalStorage>,
        pool: SqlitePool,
        _dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            upload_dir: dir.path().join("uploads"),
            max_file_size: 1_000_000,
            allowed_extensions: vec!["txt".to_string(), "pdf".to_string()],
        };
        let pool = test_pool().await;
        let storage = Arc::new(LocalStorage::new(&config).await.unwrap());
        let service = FileService::new(pool.clone(), Arc::clone(&storage), &config);

        Fixture {
            service,
            storage,
            pool,
            _dir: dir,
        }
    }

    fn session(id: i64, role: Role, department_id: Option<i64>) -> AuthenticatedUser {
        AuthenticatedUser {
            id,
            username: format!("user{}", id),
            role,
            department_id,
        }
    }

    fn incoming(name: &str, data: &[u8]) -> IncomingFile {
        IncomingFile {
            filename: name.to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_display_name_strips_client_paths() {
        assert_eq!(display_name("C:\\Users\\me\\report.pdf"), "report.pdf");
        assert_eq!(display_name("../../etc/passwd"), "passwd");
        assert_eq!(display_name("  notes.txt "), "notes.txt");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn test_keep_extension() {
        assert_eq!(keep_extension("report.pdf", "summary"), "summary.pdf");
        assert_eq!(keep_extension("report.pdf", "summary.txt"), "summary.txt");
        assert_eq!(keep_extension("README", "readme"), "readme");
        assert_eq!(keep_extension("report.pdf", ".hidden"), ".hidden");
        assert_eq!(keep_extension("report.pdf", "draft."), "draft.pdf");
        assert_eq!(keep_extension(".env", "config"), "config.env");
    }

    #[test]
    fn test_lowercase_extension() {
        assert_eq!(lowercase_extension("Scan.PDF"), "pdf");
        assert_eq!(lowercase_extension("archive.tar.gz"), "gz");
        assert_eq!(lowercase_extension(".txt"), "txt");
        assert_eq!(lowercase_extension("notes"), "");
        assert_eq!(lowercase_extension("notes."), "");
    }

    #[test]
    fn test_upload_flash_messages() {
        assert_eq!(
            UploadSummary::default().flash(),
            Flash::error("No files selected for upload or invalid request.")
        );

        let partial = UploadSummary {
            stored: Vec::new(),
            errors: vec!["File 'a.exe': Invalid file type.".to_string()],
        };
        let flash = partial.flash();
        assert_eq!(flash.kind, FlashKind::Error);
        assert_eq!(flash.messages, vec!["File 'a.exe': Invalid file type."]);
    }

    #[test]
    fn test_batch_delete_flash_messages() {
        let msg = |deleted, failed| BatchDeleteSummary { deleted, failed }.flash();
        assert_eq!(msg(2, 0), Flash::success("Successfully deleted 2 file(s)."));
        assert_eq!(msg(1, 2), Flash::error("Deleted 1 file(s) with 2 failure(s)."));
        assert_eq!(msg(0, 3), Flash::error("Failed to delete 3 file(s)."));
        assert_eq!(msg(0, 0), Flash::error("No valid file(s) selected for deletion."));
    }

    #[tokio::test]
    async fn test_upload_stores_and_records() {
        let fx = fixture().await;
        let dept = create_test_department(&fx.pool, "IT").await;
        let uid = create_test_user(&fx.pool, "alice", "user", Some(dept)).await;
        let user = session(uid, Role::User, Some(dept));

        let summary = fx
            .service
            .upload_many(&user, vec![incoming("Notes.TXT", b"hello")])
            .await
            .unwrap();

        assert_eq!(summary.errors, Vec::<String>::new());
        assert_eq!(summary.stored.len(), 1);
        let file = &summary.stored[0];
        assert_eq!(file.filename, "Notes.TXT");
        assert_eq!(file.size, 5);
        assert_eq!(file.department_id, Some(dept));
        assert!(file.filepath.starts_with("file_"));
        assert!(file.filepath.ends_with(".txt"));
        assert!(fx.storage.exists(&file.filepath).await.unwrap());
        assert_eq!(summary.flash(), Flash::success("File uploaded successfully!"));

        let listed = fx.service.list_for_user(uid).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].uploader, "alice");
        assert_eq!(listed[0].department_name.as_deref(), Some("IT"));
    }

    #[tokio::test]
    async fn test_upload_rejects_type_and_size_per_file() {
        let fx = fixture().await;
        let uid = create_test_user(&fx.pool, "alice", "user", None).await;
        let user = session(uid, Role::User, None);

        let big = vec![0u8; 1_000_001];
        let summary = fx
            .service
            .upload_many(
                &user,
                vec![
                    incoming("ok.txt", b"x"),
                    incoming("virus.exe", b"x"),
                    incoming("big.pdf", &big),
                    incoming("", b"ignored"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(summary.stored.len(), 1);
        assert_eq!(
            summary.errors,
            vec![
                "File 'virus.exe': Invalid file type. Only TXT, PDF are allowed.".to_string(),
                "File 'big.pdf' is too large. Maximum 1MB allowed.".to_string(),
            ]
        );

        let flash = summary.flash();
        assert_eq!(flash.kind, FlashKind::Error);
        assert_eq!(flash.messages[0], "File uploaded successfully!");
        assert_eq!(flash.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_no_orphaned_object() {
        let fx = fixture().await;
        // No such user row, so the foreign key makes the insert fail
        let ghost = session(4242, Role::User, None);

        let summary = fx
            .service
            .upload_many(&ghost, vec![incoming("a.txt", b"data")])
            .await
            .unwrap();

        assert!(summary.stored.is_empty());
        assert_eq!(
            summary.errors,
            vec!["File 'a.txt': Error recording in database.".to_string()]
        );

        let mut entries = tokio::fs::read_dir(fx.storage.root()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_store_is_reported() {
        let fx = fixture().await;
        let uid = create_test_user(&fx.pool, "alice", "user", None).await;
        tokio::fs::remove_dir_all(fx.storage.root()).await.unwrap();

        let summary = fx
            .service
            .upload_many(&session(uid, Role::User, None), vec![incoming("a.txt", b"x")])
            .await
            .unwrap();

        assert_eq!(
            summary.errors,
            vec!["File 'a.txt': Failed to store file.".to_string()]
        );
        assert!(fx.service.list_for_user(uid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_object() {
        let fx = fixture().await;
        let uid = create_test_user(&fx.pool, "alice", "user", None).await;
        let user = session(uid, Role::User, None);
        let summary = fx
            .service
            .upload_many(&user, vec![incoming("a.txt", b"x")])
            .await
            .unwrap();
        let file = &summary.stored[0];

        let deleted = fx.service.delete(&user, file.id).await.unwrap();
        assert!(deleted.object_removed);
        assert!(fx.service.find_by_id(file.id).await.unwrap().is_none());
        assert!(!fx.storage.exists(&file.filepath).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_object() {
        let fx = fixture().await;
        let uid = create_test_user(&fx.pool, "alice", "user", None).await;
        let user = session(uid, Role::User, None);
        let summary = fx
            .service
            .upload_many(&user, vec![incoming("a.txt", b"x")])
            .await
            .unwrap();
        let file = &summary.stored[0];
        fx.storage.delete(&file.filepath).await.unwrap();

        let deleted = fx.service.delete(&user, file.id).await.unwrap();
        assert!(!deleted.object_removed);
        assert!(fx.service.find_by_id(file.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_permissions() {
        let fx = fixture().await;
        let dept = create_test_department(&fx.pool, "IT").await;
        let owner_id = create_test_user(&fx.pool, "alice", "user", Some(dept)).await;
        let other_id = create_test_user(&fx.pool, "bob", "user", Some(dept)).await;
        let admin_id = create_test_user(&fx.pool, "root", "admin", None).await;

        let owner = session(owner_id, Role::User, Some(dept));
        let other = session(other_id, Role::User, Some(dept));
        let admin = session(admin_id, Role::Admin, None);

        let summary = fx
            .service
            .upload_many(&owner, vec![incoming("a.txt", b"x")])
            .await
            .unwrap();
        let file_id = summary.stored[0].id;

        // Same department may download but not delete
        assert!(fx.service.download(&other, file_id).await.is_ok());
        let Err(AppError::Forbidden(msg)) = fx.service.delete(&other, file_id).await else {
            panic!("same-department user should not delete");
        };
        assert_eq!(msg, "You do not have permission to delete this file.");

        assert!(fx.service.delete(&admin, file_id).await.is_ok());
        assert!(matches!(
            fx.service.delete(&admin, file_id).await,
            Err(AppError::NotFound(msg)) if msg == "File not found."
        ));
    }

    #[tokio::test]
    async fn test_download_denied_outside_department() {
        let fx = fixture().await;
        let it = create_test_department(&fx.pool, "IT").await;
        let hr = create_test_department(&fx.pool, "HR").await;
        let owner_id = create_test_user(&fx.pool, "alice", "user", Some(it)).await;
        let outsider_id = create_test_user(&fx.pool, "eve", "user", Some(hr)).await;

        let owner = session(owner_id, Role::User, Some(it));
        let summary = fx
            .service
            .upload_many(&owner, vec![incoming("a.txt", b"secret")])
            .await
            .unwrap();
        let file_id = summary.stored[0].id;

        let (_, bytes) = fx.service.download(&owner, file_id).await.unwrap();
        assert_eq!(bytes, b"secret");

        let outsider = session(outsider_id, Role::User, Some(hr));
        assert!(matches!(
            fx.service.download(&outsider, file_id).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_download_missing_object_is_not_found() {
        let fx = fixture().await;
        let uid = create_test_user(&fx.pool, "alice", "user", None).await;
        let user = session(uid, Role::User, None);
        let summary = fx
            .service
            .upload_many(&user, vec![incoming("a.txt", b"x")])
            .await
            .unwrap();
        fx.storage.delete(&summary.stored[0].filepath).await.unwrap();

        let err = fx
            .service
            .download(&user, summary.stored[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[tokio::test]
    async fn test_delete_many_counts_outcomes() {
        let fx = fixture().await;
        let uid = create_test_user(&fx.pool, "alice", "user", None).await;
        let user = session(uid, Role::User, None);
        let summary = fx
            .service
            .upload_many(&user, vec![incoming("a.txt", b"x"), incoming("b.txt", b"y")])
            .await
            .unwrap();
        let ids: Vec<i64> = summary.stored.iter().map(|f| f.id).chain([999]).collect();

        let result = fx.service.delete_many(&user, &ids).await;
        assert_eq!(result, BatchDeleteSummary { deleted: 2, failed: 1 });
    }

    #[tokio::test]
    async fn test_rename_keeps_extension_and_key() {
        let fx = fixture().await;
        let uid = create_test_user(&fx.pool, "alice", "user", None).await;
        let user = session(uid, Role::User, None);
        let summary = fx
            .service
            .upload_many(&user, vec![incoming("draft.pdf", b"x")])
            .await
            .unwrap();
        let original = &summary.stored[0];

        let renamed = fx
            .service
            .rename(
                original.id,
                RenameFileDto {
                    filename: "final".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.filename, "final.pdf");
        assert_eq!(renamed.filepath, original.filepath);

        let err = fx
            .service
            .rename(original.id, RenameFileDto { filename: String::new() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_all_paginated() {
        let fx = fixture().await;
        let uid = create_test_user(&fx.pool, "alice", "user", None).await;
        let user = session(uid, Role::User, None);
        let parts = (0..12)
            .map(|i| incoming(&format!("f{}.txt", i), b"x"))
            .collect();
        fx.service.upload_many(&user, parts).await.unwrap();

        let (first, total) = fx
            .service
            .list_all_paginated(Pagination::new(1, 10))
            .await
            .unwrap();
        assert_eq!(total, 12);
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].filename, "f11.txt");

        let (second, _) = fx
            .service
            .list_all_paginated(Pagination::new(2, 10))
            .await
            .unwrap();
        assert_eq!(second.len(), 2);
    }
}
