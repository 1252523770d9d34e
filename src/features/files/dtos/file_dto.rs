use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::files::models::{File, FileWithOwner};

/// Upload form for OpenAPI documentation.
/// The handlers read multipart fields directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFilesDto {
    /// One or more files, repeated under the `files` field
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub files: Vec<String>,
}

/// A file listed with its uploader and department
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileResponseDto {
    pub id: i64,
    /// Display name as uploaded
    pub filename: String,
    /// Size in bytes
    pub size: i64,
    pub uploaded_by: i64,
    /// Username of the uploader
    pub uploader: String,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub upload_date: DateTime<Utc>,
}

impl From<FileWithOwner> for FileResponseDto {
    fn from(file: FileWithOwner) -> Self {
        Self {
            id: file.id,
            filename: file.filename,
            size: file.size,
            uploaded_by: file.uploaded_by,
            uploader: file.uploader,
            department_id: file.department_id,
            department_name: file.department_name,
            upload_date: file.upload_date,
        }
    }
}

/// A file stored by an upload request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoredFileDto {
    pub id: i64,
    pub filename: String,
    pub size: i64,
    pub department_id: Option<i64>,
    pub upload_date: DateTime<Utc>,
}

impl From<File> for StoredFileDto {
    fn from(file: File) -> Self {
        Self {
            id: file.id,
            filename: file.filename,
            size: file.size,
            department_id: file.department_id,
            upload_date: file.upload_date,
        }
    }
}

/// Outcome of a multi-file upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResultDto {
    /// Files that were stored and recorded
    pub files: Vec<StoredFileDto>,
    /// One message per rejected or failed file
    pub errors: Vec<String>,
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteFileResponseDto {
    pub deleted: bool,
    pub message: String,
    /// "success" or "error"
    pub message_type: String,
}

/// One page of the admin file table
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminFilePageDto {
    pub items: Vec<FileResponseDto>,
    pub current_page: i64,
    pub total_pages: i64,
    /// Server-rendered `<tr>` rows for the page
    pub table_html: String,
}

/// Batch delete form; `file_ids` repeats once per checked row
#[derive(Debug, Default, Deserialize)]
pub struct BatchDeleteForm {
    #[serde(default)]
    pub file_ids: Vec<String>,
}

impl BatchDeleteForm {
    /// Numeric ids in submission order; anything else is dropped
    pub fn ids(&self) -> Vec<i64> {
        self.file_ids
            .iter()
            .filter_map(|raw| raw.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .collect()
    }
}

/// Rename form posted by the admin edit page
#[derive(Debug, Default, Deserialize)]
pub struct RenameFileForm {
    #[serde(default)]
    pub filename: String,
}

/// Validated new display name
#[derive(Debug, Validate)]
pub struct RenameFileDto {
    #[validate(length(min = 1, max = 255, message = "Invalid file ID or filename provided."))]
    pub filename: String,
}

impl From<RenameFileForm> for RenameFileDto {
    fn from(form: RenameFileForm) -> Self {
        Self {
            filename: form.filename.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_delete_ids_skip_invalid_entries() {
        let form = BatchDeleteForm {
            file_ids: vec![
                "3".to_string(),
                "abc".to_string(),
                " 7 ".to_string(),
                "-1".to_string(),
                "".to_string(),
            ],
        };
        assert_eq!(form.ids(), vec![3, 7]);
    }

    #[test]
    fn test_rename_dto_is_trimmed_and_validated() {
        let dto = RenameFileDto::from(RenameFileForm {
            filename: "   ".to_string(),
        });
        assert!(dto.validate().is_err());

        let dto = RenameFileDto::from(RenameFileForm {
            filename: "  report  ".to_string(),
        });
        assert_eq!(dto.filename, "report");
        assert!(dto.validate().is_ok());
    }
}
