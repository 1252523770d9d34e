//! Storage module for uploaded files
//!
//! Provides the local-disk object store used for uploads, downloads and deletes.

mod local_storage;

pub use local_storage::{LocalStorage, StorageError};
