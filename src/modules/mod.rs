//! Modules layer - Infrastructure components
//!
//! Contains adapters for resources outside the database, such as file storage.

pub mod storage;
