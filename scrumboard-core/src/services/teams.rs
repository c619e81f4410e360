//! Teams, team membership and project ↔ team assignment.

use tracing::{debug, info};

use super::projects::require_project;
use super::users::require_user;
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    AddUserToTeamInput, CreateTeamInput, CreateUserInput, ProjectAccess, ProjectTeam, Team,
    TeamSummary, TeamUser, UpdateTeamInput,
};

fn require_team(db: &Database, id: i64) -> ServiceResult<Team> {
    db.get_team(id)?.ok_or_else(|| ServiceError::not_found("Team"))
}

fn summary(db: &Database, team: Team) -> ServiceResult<TeamSummary> {
    Ok(TeamSummary {
        member_count: db.count_team_members(team.id)?,
        id: team.id,
        name: team.name,
        description: team.description,
    })
}

pub fn list_teams(db: &Database) -> ServiceResult<Vec<TeamSummary>> {
    let teams = db.get_team_summaries()?;
    debug!(count = teams.len(), "listed teams");
    Ok(teams)
}

pub fn get_team(db: &Database, id: i64) -> ServiceResult<TeamSummary> {
    summary(db, require_team(db, id)?)
}

pub fn create_team(db: &Database, input: CreateTeamInput) -> ServiceResult<TeamSummary> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::invalid("Team name is required"));
    }
    if db.get_team_by_name(&input.name)?.is_some() {
        return Err(ServiceError::conflict("Team name already exists"));
    }
    let team = db.create_team(input)?;
    info!(team_id = team.id, name = %team.name, "created team");
    summary(db, team)
}

pub fn update_team(db: &Database, id: i64, input: UpdateTeamInput) -> ServiceResult<TeamSummary> {
    require_team(db, id)?;
    if let Some(name) = input.name.as_deref() {
        if let Some(existing) = db.get_team_by_name(name)? {
            if existing.id != id {
                return Err(ServiceError::conflict("Team name already exists"));
            }
        }
    }
    db.update_team(id, input)?;
    info!(team_id = id, "updated team");
    get_team(db, id)
}

pub fn delete_team(db: &Database, id: i64) -> ServiceResult<()> {
    if !db.delete_team(id)? {
        return Err(ServiceError::not_found("Team"));
    }
    info!(team_id = id, "deleted team");
    Ok(())
}

pub fn list_team_users(db: &Database, team_id: i64) -> ServiceResult<Vec<TeamUser>> {
    require_team(db, team_id)?;
    Ok(db.get_team_users(team_id)?)
}

/// Add an existing user, or find-or-create one by email, to the team.
///
/// Adding someone who is already a member only updates their team role.
pub fn add_user_to_team(
    db: &Database,
    team_id: i64,
    input: AddUserToTeamInput,
) -> ServiceResult<TeamUser> {
    require_team(db, team_id)?;

    let user = match (input.user_id, input.name, input.email) {
        (Some(user_id), _, _) => require_user(db, user_id)?,
        (None, Some(name), Some(email)) => match db.get_user_by_email(&email)? {
            Some(user) => user,
            None => {
                let user = db.create_user(CreateUserInput {
                    name,
                    email,
                    settings: None,
                })?;
                info!(user_id = user.id, "created user while adding to team");
                user
            }
        },
        _ => {
            return Err(ServiceError::invalid(
                "Provide user_id or both name and email",
            ))
        }
    };

    let team_role = match db.get_membership(team_id, user.id)? {
        Some(existing) => match input.team_role {
            Some(role) => {
                db.set_membership_role(team_id, user.id, &role)?;
                Some(role)
            }
            None => existing.role,
        },
        None => {
            db.create_membership(team_id, user.id, input.team_role.as_deref())?;
            info!(team_id, user_id = user.id, "added user to team");
            input.team_role
        }
    };

    Ok(TeamUser {
        user_id: user.id,
        name: user.name,
        email: user.email,
        team_role,
    })
}

pub fn remove_user_from_team(db: &Database, team_id: i64, user_id: i64) -> ServiceResult<()> {
    if !db.delete_membership(team_id, user_id)? {
        return Err(ServiceError::not_found("Team membership"));
    }
    info!(team_id, user_id, "removed user from team");
    Ok(())
}

pub fn list_project_teams(db: &Database, project_id: i64) -> ServiceResult<Vec<ProjectTeam>> {
    require_project(db, project_id)?;
    Ok(db.get_project_teams(project_id)?)
}

/// Idempotent.
pub fn assign_team_to_project(
    db: &Database,
    project_id: i64,
    team_id: i64,
) -> ServiceResult<ProjectTeam> {
    require_project(db, project_id)?;
    let team = require_team(db, team_id)?;
    db.assign_project_team(project_id, team_id)?;
    info!(project_id, team_id, "assigned team to project");
    Ok(ProjectTeam {
        project_id,
        team_id,
        team_name: team.name,
    })
}

pub fn unassign_team_from_project(
    db: &Database,
    project_id: i64,
    team_id: i64,
) -> ServiceResult<()> {
    if !db.unassign_project_team(project_id, team_id)? {
        return Err(ServiceError::not_found("Project team assignment"));
    }
    info!(project_id, team_id, "unassigned team from project");
    Ok(())
}

/// Open when no team is assigned to the project; otherwise the user must
/// belong to one of the assigned teams.
pub fn can_user_access_project(db: &Database, user_id: i64, project_id: i64) -> ServiceResult<bool> {
    if db.get_project_teams(project_id)?.is_empty() {
        return Ok(true);
    }
    Ok(db.is_member_of_project_team(user_id, project_id)?)
}

pub fn check_project_access(
    db: &Database,
    project_id: i64,
    user_id: i64,
) -> ServiceResult<ProjectAccess> {
    Ok(ProjectAccess {
        allowed: can_user_access_project(db, user_id, project_id)?,
        user_id,
        project_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateProjectInput;
    use crate::services::projects::create_project;

    fn project(db: &Database) -> i64 {
        create_project(
            db,
            CreateProjectInput {
                name: "Apollo".into(),
                key: "APL".into(),
                ..Default::default()
            },
        )
        .unwrap()
        .project
        .id
    }

    fn team(db: &Database, name: &str) -> i64 {
        create_team(
            db,
            CreateTeamInput {
                name: name.into(),
                description: None,
            },
        )
        .unwrap()
        .id
    }

    fn add(db: &Database, team_id: i64, name: &str, email: &str) -> TeamUser {
        add_user_to_team(
            db,
            team_id,
            AddUserToTeamInput {
                name: Some(name.into()),
                email: Some(email.into()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn access_is_open_without_assigned_teams() {
        let db = Database::open_memory().unwrap();
        let project_id = project(&db);
        assert!(can_user_access_project(&db, 1234, project_id).unwrap());
    }

    #[test]
    fn access_requires_membership_once_teams_are_assigned() {
        let db = Database::open_memory().unwrap();
        let project_id = project(&db);
        let core = team(&db, "Core");
        let other = team(&db, "Other");
        let insider = add(&db, core, "Ada", "ada@example.com");
        let outsider = add(&db, other, "Bob", "bob@example.com");

        assign_team_to_project(&db, project_id, core).unwrap();

        assert!(can_user_access_project(&db, insider.user_id, project_id).unwrap());
        assert!(!can_user_access_project(&db, outsider.user_id, project_id).unwrap());
    }

    #[test]
    fn adding_by_email_reuses_existing_user() {
        let db = Database::open_memory().unwrap();
        let a = team(&db, "A");
        let b = team(&db, "B");
        let first = add(&db, a, "Ada", "ada@example.com");
        let second = add(&db, b, "Ada L.", "ada@example.com");
        assert_eq!(first.user_id, second.user_id);
        assert_eq!(get_team(&db, a).unwrap().member_count, 1);

        let again = add_user_to_team(
            &db,
            a,
            AddUserToTeamInput {
                user_id: Some(first.user_id),
                team_role: Some("Lead".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(again.team_role.as_deref(), Some("Lead"));
        assert_eq!(get_team(&db, a).unwrap().member_count, 1);
    }

    #[test]
    fn adding_without_identity_is_invalid() {
        let db = Database::open_memory().unwrap();
        let a = team(&db, "A");
        let result = add_user_to_team(
            &db,
            a,
            AddUserToTeamInput {
                name: Some("Nameless".into()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }
}
