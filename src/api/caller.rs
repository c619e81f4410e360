//! Caller identity from the `X-User-Id` header.
//!
//! Requests without the header are trusted and skip permission checks.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::ApiError;
use crate::services::{access, sprints};
use crate::{Database, ServiceError};

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Option<i64>);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Caller(None));
        };
        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|id| Caller(Some(id)))
            .ok_or_else(|| ServiceError::invalid("Invalid X-User-Id header").into())
    }
}

impl Caller {
    /// Project-level action, checked against the coarse role table.
    pub fn require(&self, db: &Database, project_id: i64, action: &str) -> Result<(), ApiError> {
        if let Some(user_id) = self.0 {
            access::check_role_permission(db, user_id, project_id, action)?;
        }
        Ok(())
    }

    /// Section-level action, checked against the granular table.
    pub fn require_section(
        &self,
        db: &Database,
        project_id: i64,
        section: &str,
        action: &str,
    ) -> Result<(), ApiError> {
        if let Some(user_id) = self.0 {
            access::check_section_permission(db, user_id, project_id, section, action)?;
        }
        Ok(())
    }

    /// Section-level action on the project that owns `sprint_id`.
    pub fn require_for_sprint(
        &self,
        db: &Database,
        sprint_id: i64,
        section: &str,
        action: &str,
    ) -> Result<(), ApiError> {
        if self.0.is_none() {
            return Ok(());
        }
        let sprint = sprints::require_sprint(db, sprint_id)?;
        self.require_section(db, sprint.project_id, section, action)
    }
}
