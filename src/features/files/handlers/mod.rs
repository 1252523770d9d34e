pub mod file_handler;
pub mod file_page_handler;

pub use file_handler::{__path_delete_file, __path_upload_files};
