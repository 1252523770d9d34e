/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Files shown per page on the admin dashboard
pub const ADMIN_FILES_PER_PAGE: i64 = 10;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Administrator role - full access to users, departments and all files
pub const ROLE_ADMIN: &str = "admin";

/// Ordinary user role - own files only
pub const ROLE_USER: &str = "user";

// =============================================================================
// UPLOADS
// =============================================================================

/// Extensions accepted for upload unless ALLOWED_EXTENSIONS overrides them
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt",
];

/// Prefix of generated object keys
pub const STORED_FILE_PREFIX: &str = "file_";

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// COOKIES
// =============================================================================

pub const SESSION_COOKIE_NAME: &str = "dept_session";

pub const FLASH_COOKIE_NAME: &str = "dept_flash";
