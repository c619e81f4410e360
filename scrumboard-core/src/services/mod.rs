//! Business operations over [`crate::Database`].
//!
//! Each function takes the database handle and returns a
//! [`crate::ServiceResult`]; the HTTP layer is a thin wrapper around these.

pub mod access;
pub mod config;
pub mod export;
pub mod ingestion;
pub mod organizations;
pub mod projects;
pub mod reports;
pub mod retrospectives;
pub mod sprints;
pub mod teams;
pub mod users;
pub mod work_items;
