//! Sprint lifecycle: planning → active → completed.
//!
//! Only one sprint per project may be active. Activation completes whichever
//! sprint currently holds that slot; concurrent activations are
//! last-writer-wins.

use tracing::{debug, info};

use super::projects::require_project;
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{CreateSprintInput, Sprint, SprintState, UpdateSprintInput};

pub fn require_sprint(db: &Database, id: i64) -> ServiceResult<Sprint> {
    db.get_sprint(id)?
        .ok_or_else(|| ServiceError::not_found("Sprint"))
}

pub fn list_sprints(db: &Database, project_id: i64) -> ServiceResult<Vec<Sprint>> {
    require_project(db, project_id)?;
    let sprints = db.get_sprints(project_id)?;
    debug!(project_id, count = sprints.len(), "listed sprints");
    Ok(sprints)
}

pub fn create_sprint(
    db: &Database,
    project_id: i64,
    mut input: CreateSprintInput,
) -> ServiceResult<Sprint> {
    require_project(db, project_id)?;
    if input.name.trim().is_empty() {
        return Err(ServiceError::invalid("Sprint name is required"));
    }

    let activate = input.state == Some(SprintState::Active);
    if activate {
        input.state = Some(SprintState::Planning);
    }
    let sprint = db.create_sprint(project_id, input)?;
    info!(project_id, sprint_id = sprint.id, "created sprint");

    if activate {
        activate_sprint(db, sprint.id)
    } else {
        Ok(sprint)
    }
}

pub fn update_sprint(db: &Database, id: i64, mut input: UpdateSprintInput) -> ServiceResult<Sprint> {
    let current = require_sprint(db, id)?;

    let mut activate = false;
    if let Some(next) = input.state {
        if !current.state.can_transition_to(next) {
            return Err(ServiceError::invalid(format!(
                "Cannot move sprint from {} to {}",
                current.state.as_str(),
                next.as_str()
            )));
        }
        if next == SprintState::Active && current.state != SprintState::Active {
            activate = true;
            input.state = None;
        }
    }

    db.update_sprint(id, input)?;
    info!(sprint_id = id, "updated sprint");

    if activate {
        activate_sprint(db, id)
    } else {
        require_sprint(db, id)
    }
}

/// Make `id` the project's active sprint, completing the previous one.
pub fn activate_sprint(db: &Database, id: i64) -> ServiceResult<Sprint> {
    let sprint = require_sprint(db, id)?;
    match sprint.state {
        SprintState::Completed => {
            return Err(ServiceError::invalid("Cannot activate a completed sprint"));
        }
        SprintState::Active => return Ok(sprint),
        SprintState::Planning => {}
    }

    if let Some(previous) = db.get_active_sprint(sprint.project_id)? {
        if previous.id != id {
            db.set_sprint_state(previous.id, SprintState::Completed)?;
            info!(
                project_id = sprint.project_id,
                sprint_id = previous.id,
                "completed previously active sprint"
            );
        }
    }

    db.set_sprint_state(id, SprintState::Active)?;
    info!(project_id = sprint.project_id, sprint_id = id, "activated sprint");
    require_sprint(db, id)
}

pub fn complete_sprint(db: &Database, id: i64) -> ServiceResult<Sprint> {
    let sprint = require_sprint(db, id)?;
    if sprint.state != SprintState::Completed {
        db.set_sprint_state(id, SprintState::Completed)?;
        info!(project_id = sprint.project_id, sprint_id = id, "completed sprint");
    }
    require_sprint(db, id)
}

pub fn delete_sprint(db: &Database, id: i64) -> ServiceResult<()> {
    if !db.delete_sprint(id)? {
        return Err(ServiceError::not_found("Sprint"));
    }
    info!(sprint_id = id, "deleted sprint");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateProjectInput;
    use crate::services::projects::create_project;

    fn setup() -> (Database, i64) {
        let db = Database::open_memory().unwrap();
        let project = create_project(
            &db,
            CreateProjectInput {
                name: "Apollo".into(),
                key: "APL".into(),
                ..Default::default()
            },
        )
        .unwrap();
        (db, project.project.id)
    }

    fn sprint(db: &Database, project_id: i64, name: &str) -> Sprint {
        create_sprint(
            db,
            project_id,
            CreateSprintInput {
                name: name.into(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn activation_completes_previous_active_sprint() {
        let (db, project_id) = setup();
        let a = sprint(&db, project_id, "Sprint A");
        let b = sprint(&db, project_id, "Sprint B");
        let c = sprint(&db, project_id, "Sprint C");

        activate_sprint(&db, a.id).unwrap();
        let b = activate_sprint(&db, b.id).unwrap();

        assert_eq!(b.state, SprintState::Active);
        assert_eq!(require_sprint(&db, a.id).unwrap().state, SprintState::Completed);
        assert_eq!(require_sprint(&db, c.id).unwrap().state, SprintState::Planning);
    }

    #[test]
    fn activation_is_scoped_to_project() {
        let (db, project_id) = setup();
        let other = create_project(
            &db,
            CreateProjectInput {
                name: "Gemini".into(),
                key: "GEM".into(),
                ..Default::default()
            },
        )
        .unwrap()
        .project
        .id;
        let a = sprint(&db, project_id, "A");
        let b = sprint(&db, other, "B");
        activate_sprint(&db, a.id).unwrap();
        activate_sprint(&db, b.id).unwrap();
        assert_eq!(require_sprint(&db, a.id).unwrap().state, SprintState::Active);
    }

    #[test]
    fn completed_sprints_cannot_go_back() {
        let (db, project_id) = setup();
        let a = sprint(&db, project_id, "A");
        complete_sprint(&db, a.id).unwrap();

        assert!(matches!(activate_sprint(&db, a.id), Err(ServiceError::InvalidInput(_))));
        let back = UpdateSprintInput {
            state: Some(SprintState::Planning),
            ..Default::default()
        };
        assert!(matches!(update_sprint(&db, a.id, back), Err(ServiceError::InvalidInput(_))));
        // completing twice is harmless
        assert_eq!(complete_sprint(&db, a.id).unwrap().state, SprintState::Completed);
    }

    #[test]
    fn update_to_active_goes_through_activation() {
        let (db, project_id) = setup();
        let a = sprint(&db, project_id, "A");
        let b = sprint(&db, project_id, "B");
        activate_sprint(&db, a.id).unwrap();

        let input = UpdateSprintInput {
            state: Some(SprintState::Active),
            goal: Some("Ship".into()),
            ..Default::default()
        };
        let b = update_sprint(&db, b.id, input).unwrap();
        assert_eq!(b.state, SprintState::Active);
        assert_eq!(b.goal.as_deref(), Some("Ship"));
        assert_eq!(require_sprint(&db, a.id).unwrap().state, SprintState::Completed);
    }

    #[test]
    fn sprint_for_missing_project_is_not_found() {
        let db = Database::open_memory().unwrap();
        let result = create_sprint(
            &db,
            99,
            CreateSprintInput {
                name: "Orphan".into(),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
