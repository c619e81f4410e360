//! Scrumboard server: the HTTP API over [`scrumboard_core`].

pub mod api;

pub use scrumboard_core::{db, models, services, Database, ServiceError, ServiceResult};
