//! User accounts and their per-project roles.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::projects::require_project;
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    AssignRoleInput, CreateUserInput, ProjectRole, Role, UpdateRoleInput, UpdateUserInput, User,
};

pub fn require_user(db: &Database, id: i64) -> ServiceResult<User> {
    db.get_user(id)?.ok_or_else(|| ServiceError::not_found("User"))
}

pub fn list_users(db: &Database) -> ServiceResult<Vec<User>> {
    let users = db.get_users()?;
    debug!(count = users.len(), "listed users");
    Ok(users)
}

pub fn create_user(db: &Database, input: CreateUserInput) -> ServiceResult<User> {
    if input.name.trim().is_empty() || input.email.trim().is_empty() {
        return Err(ServiceError::invalid("Name and email are required"));
    }
    if db.get_user_by_email(&input.email)?.is_some() {
        return Err(ServiceError::conflict("Email already exists"));
    }
    let user = db.create_user(input)?;
    info!(user_id = user.id, "created user");
    Ok(user)
}

pub fn update_user(db: &Database, id: i64, input: UpdateUserInput) -> ServiceResult<User> {
    require_user(db, id)?;
    if let Some(email) = input.email.as_deref() {
        if let Some(existing) = db.get_user_by_email(email)? {
            if existing.id != id {
                return Err(ServiceError::conflict("Email already exists"));
            }
        }
    }
    db.update_user(id, input)?;
    info!(user_id = id, "updated user");
    require_user(db, id)
}

pub fn delete_user(db: &Database, id: i64) -> ServiceResult<()> {
    if !db.delete_user(id)? {
        return Err(ServiceError::not_found("User"));
    }
    info!(user_id = id, "deleted user");
    Ok(())
}

// Roles

fn validate_role(role: &str) -> ServiceResult<()> {
    match Role::from_str(role) {
        Some(_) => Ok(()),
        None => Err(ServiceError::invalid(format!(
            "Invalid role: {role}. Expected Admin, Member or Viewer"
        ))),
    }
}

fn validate_permissions(permissions: Option<&str>) -> ServiceResult<()> {
    if let Some(raw) = permissions {
        serde_json::from_str::<BTreeMap<String, Vec<String>>>(raw).map_err(|err| {
            ServiceError::invalid(format!("Invalid permissions JSON: {err}"))
        })?;
    }
    Ok(())
}

pub fn list_project_roles(db: &Database, project_id: i64) -> ServiceResult<Vec<ProjectRole>> {
    require_project(db, project_id)?;
    Ok(db.get_project_roles(project_id)?)
}

pub fn get_user_role(db: &Database, project_id: i64, user_id: i64) -> ServiceResult<ProjectRole> {
    db.get_project_role(user_id, project_id)?
        .ok_or_else(|| ServiceError::not_found("Role"))
}

/// Create the user's role on the project, or replace it if one exists.
pub fn assign_role(
    db: &Database,
    project_id: i64,
    input: AssignRoleInput,
) -> ServiceResult<ProjectRole> {
    validate_role(&input.role)?;
    validate_permissions(input.permissions.as_deref())?;
    require_project(db, project_id)?;
    require_user(db, input.user_id)?;

    match db.get_project_role(input.user_id, project_id)? {
        Some(existing) => {
            db.update_role(
                existing.id,
                UpdateRoleInput {
                    role: Some(input.role),
                    permissions: input.permissions,
                },
            )?;
            info!(project_id, user_id = input.user_id, "updated project role");
            db.get_role(existing.id)?
                .ok_or_else(|| ServiceError::not_found("Role"))
        }
        None => {
            let role = db.create_role(
                input.user_id,
                project_id,
                &input.role,
                input.permissions.as_deref(),
            )?;
            info!(project_id, user_id = input.user_id, role = %role.role, "assigned project role");
            Ok(role)
        }
    }
}

pub fn update_role(db: &Database, id: i64, input: UpdateRoleInput) -> ServiceResult<ProjectRole> {
    if let Some(role) = input.role.as_deref() {
        validate_role(role)?;
    }
    validate_permissions(input.permissions.as_deref())?;
    if !db.update_role(id, input)? {
        return Err(ServiceError::not_found("Role"));
    }
    info!(role_id = id, "updated project role");
    db.get_role(id)?.ok_or_else(|| ServiceError::not_found("Role"))
}

pub fn delete_role(db: &Database, id: i64) -> ServiceResult<()> {
    if !db.delete_role(id)? {
        return Err(ServiceError::not_found("Role"));
    }
    info!(role_id = id, "deleted project role");
    Ok(())
}
