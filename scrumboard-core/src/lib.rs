//! Core library for Scrumboard.
//!
//! This crate provides the domain models, SQLite persistence and the service
//! layer (validation, sprint lifecycle, imports, reports), independent of the
//! HTTP transport.
//!
//! # Usage
//!
//! ```no_run
//! use scrumboard_core::db::Database;
//! use scrumboard_core::services::config;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let effective = config::resolve_config(&db, None)?;
//! assert!(effective.contains_key("work_item_types"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod db;
pub mod error;
pub mod models;
pub mod services;

// Re-export commonly used types at crate root
pub use db::Database;
pub use error::{ServiceError, ServiceResult};
