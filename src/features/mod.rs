pub mod auth;
pub mod dashboard;
pub mod departments;
pub mod files;
pub mod users;
