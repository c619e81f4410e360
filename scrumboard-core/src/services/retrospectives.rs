use tracing::info;

use super::sprints::require_sprint;
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Retrospective, RetrospectiveInput};

pub fn get_retrospective(db: &Database, sprint_id: i64) -> ServiceResult<Retrospective> {
    require_sprint(db, sprint_id)?;
    db.get_retrospective(sprint_id)?
        .ok_or_else(|| ServiceError::not_found("Retrospective"))
}

/// One retrospective per sprint.
pub fn create_retrospective(
    db: &Database,
    sprint_id: i64,
    input: RetrospectiveInput,
) -> ServiceResult<Retrospective> {
    require_sprint(db, sprint_id)?;
    if db.get_retrospective(sprint_id)?.is_some() {
        return Err(ServiceError::conflict("Retrospective already exists for this sprint"));
    }
    let retro = db.create_retrospective(sprint_id, input)?;
    info!(sprint_id, "created retrospective");
    Ok(retro)
}

pub fn update_retrospective(
    db: &Database,
    sprint_id: i64,
    input: RetrospectiveInput,
) -> ServiceResult<Retrospective> {
    if !db.update_retrospective(sprint_id, input)? {
        return Err(ServiceError::not_found("Retrospective"));
    }
    info!(sprint_id, "updated retrospective");
    get_retrospective(db, sprint_id)
}

pub fn delete_retrospective(db: &Database, sprint_id: i64) -> ServiceResult<()> {
    if !db.delete_retrospective(sprint_id)? {
        return Err(ServiceError::not_found("Retrospective"));
    }
    info!(sprint_id, "deleted retrospective");
    Ok(())
}
