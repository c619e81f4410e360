//! Projects and their per-project roster.

use tracing::{debug, info};

use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    CreateProjectInput, CreateTeamMemberInput, Project, ProjectDetail, ProjectSummary,
    TeamMember, UpdateProjectInput, UpdateTeamMemberInput,
};

pub fn require_project(db: &Database, id: i64) -> ServiceResult<Project> {
    db.get_project(id)?
        .ok_or_else(|| ServiceError::not_found("Project"))
}

fn summarize(db: &Database, project: Project) -> ServiceResult<ProjectSummary> {
    let sprints = db.get_sprints(project.id)?;
    Ok(ProjectSummary::new(project, &sprints))
}

pub fn list_projects(db: &Database, org_id: Option<i64>) -> ServiceResult<Vec<ProjectSummary>> {
    let projects = db.get_projects(org_id)?;
    debug!(?org_id, count = projects.len(), "listed projects");
    projects.into_iter().map(|p| summarize(db, p)).collect()
}

pub fn get_project(db: &Database, id: i64) -> ServiceResult<ProjectDetail> {
    let project = require_project(db, id)?;
    let sprints = db.get_sprints(id)?;
    Ok(ProjectDetail {
        summary: ProjectSummary::new(project, &sprints),
        sprints,
    })
}

fn check_org(db: &Database, org_id: Option<i64>) -> ServiceResult<()> {
    if let Some(org_id) = org_id {
        if db.get_organization(org_id)?.is_none() {
            return Err(ServiceError::not_found("Organization"));
        }
    }
    Ok(())
}

pub fn create_project(db: &Database, mut input: CreateProjectInput) -> ServiceResult<ProjectSummary> {
    input.key = input.key.trim().to_uppercase();
    if input.name.trim().is_empty() || input.key.is_empty() {
        return Err(ServiceError::invalid("Project name and key are required"));
    }
    if db.get_project_by_key(&input.key)?.is_some() {
        return Err(ServiceError::conflict("Project key already exists"));
    }
    check_org(db, input.org_id)?;

    let project = db.create_project(input)?;
    info!(id = project.id, key = %project.key, "created project");
    summarize(db, project)
}

pub fn update_project(
    db: &Database,
    id: i64,
    mut input: UpdateProjectInput,
) -> ServiceResult<ProjectSummary> {
    require_project(db, id)?;
    if let Some(key) = input.key.as_mut() {
        *key = key.trim().to_uppercase();
        if let Some(existing) = db.get_project_by_key(key)? {
            if existing.id != id {
                return Err(ServiceError::conflict("Project key already exists"));
            }
        }
    }
    check_org(db, input.org_id)?;

    db.update_project(id, input)?;
    info!(id, "updated project");
    summarize(db, require_project(db, id)?)
}

pub fn delete_project(db: &Database, id: i64) -> ServiceResult<()> {
    if !db.delete_project(id)? {
        return Err(ServiceError::not_found("Project"));
    }
    info!(id, "deleted project");
    Ok(())
}

// Roster

pub fn list_team_members(db: &Database, project_id: i64) -> ServiceResult<Vec<TeamMember>> {
    require_project(db, project_id)?;
    Ok(db.get_team_members(project_id)?)
}

pub fn add_team_member(
    db: &Database,
    project_id: i64,
    input: CreateTeamMemberInput,
) -> ServiceResult<TeamMember> {
    require_project(db, project_id)?;
    if db.get_team_member_by_email(&input.email)?.is_some() {
        return Err(ServiceError::conflict("Email already exists"));
    }
    let member = db.create_team_member(project_id, input)?;
    info!(project_id, member_id = member.id, "added team member");
    Ok(member)
}

pub fn update_team_member(
    db: &Database,
    project_id: i64,
    member_id: i64,
    input: UpdateTeamMemberInput,
) -> ServiceResult<TeamMember> {
    if db.get_team_member(project_id, member_id)?.is_none() {
        return Err(ServiceError::not_found("Team member"));
    }
    if let Some(email) = input.email.as_deref() {
        if let Some(existing) = db.get_team_member_by_email(email)? {
            if existing.id != member_id {
                return Err(ServiceError::conflict("Email already exists"));
            }
        }
    }
    db.update_team_member(project_id, member_id, input)?;
    db.get_team_member(project_id, member_id)?
        .ok_or_else(|| ServiceError::not_found("Team member"))
}

pub fn remove_team_member(db: &Database, project_id: i64, member_id: i64) -> ServiceResult<()> {
    if !db.delete_team_member(project_id, member_id)? {
        return Err(ServiceError::not_found("Team member"));
    }
    info!(project_id, member_id, "removed team member");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, key: &str) -> CreateProjectInput {
        CreateProjectInput {
            name: name.to_string(),
            key: key.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn key_is_uppercased_and_unique() {
        let db = Database::open_memory().unwrap();
        let created = create_project(&db, input("Apollo", "apl")).unwrap();
        assert_eq!(created.project.key, "APL");
        assert_eq!(created.project.methodology, "Scrum");
        assert_eq!(created.sprint_count, 0);

        let err = create_project(&db, input("Other", "APL")).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn missing_project_is_not_found() {
        let db = Database::open_memory().unwrap();
        assert!(matches!(get_project(&db, 42), Err(ServiceError::NotFound(_))));
        assert!(matches!(delete_project(&db, 42), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn unknown_org_is_not_found() {
        let db = Database::open_memory().unwrap();
        let mut orphan = input("Apollo", "APL");
        orphan.org_id = Some(99);
        let err = create_project(&db, orphan).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref what) if what == "Organization"));

        let p = create_project(&db, input("Apollo", "APL")).unwrap().project;
        let update = UpdateProjectInput {
            org_id: Some(99),
            ..Default::default()
        };
        assert!(matches!(
            update_project(&db, p.id, update),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn roster_email_must_be_unique() {
        let db = Database::open_memory().unwrap();
        let p = create_project(&db, input("Apollo", "APL")).unwrap().project;
        let member = CreateTeamMemberInput {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role: Some("Dev".into()),
        };
        add_team_member(&db, p.id, member.clone()).unwrap();
        assert!(matches!(
            add_team_member(&db, p.id, member),
            Err(ServiceError::Conflict(_))
        ));
        assert_eq!(list_team_members(&db, p.id).unwrap().len(), 1);
    }
}
