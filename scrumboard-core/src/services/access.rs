//! Role-based permission checks.
//!
//! Two tables are consulted. The coarse table maps a role to project-level
//! actions. The granular table maps a role to per-section actions and can be
//! overridden per [`ProjectRole`] by a JSON object whose sections replace the
//! defaults. Users without a role on the project are denied by both.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{ProjectRole, Role};

/// Section name → allowed actions.
pub type PermissionMap = BTreeMap<String, Vec<String>>;

pub const SECTIONS: [&str; 5] = ["tasks", "sprints", "retrospectives", "team", "settings"];

const ALL: &[&str] = &["create", "update", "delete", "view"];
const MEMBER: &[&str] = &["update", "view"];
const VIEW: &[&str] = &["view"];
const TEAM_ADMIN: &[&str] = &["add", "update", "delete", "view"];

/// Project-level actions for a role.
pub fn role_actions(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => ALL,
        Role::Member => MEMBER,
        Role::Viewer => VIEW,
    }
}

/// Default per-section actions for a role.
pub fn default_section_permissions(role: Role) -> PermissionMap {
    let table: [&[&str]; 5] = match role {
        Role::Admin => [ALL, ALL, ALL, TEAM_ADMIN, MEMBER],
        Role::Member => [MEMBER, VIEW, VIEW, VIEW, VIEW],
        Role::Viewer => [VIEW; 5],
    };
    SECTIONS
        .iter()
        .zip(table)
        .map(|(section, actions)| {
            let actions = actions.iter().map(|a| a.to_string()).collect();
            (section.to_string(), actions)
        })
        .collect()
}

fn role_for(db: &Database, user_id: i64, project_id: i64) -> ServiceResult<ProjectRole> {
    db.get_project_role(user_id, project_id)?
        .ok_or_else(|| ServiceError::forbidden("No role assigned for this project"))
}

/// Defaults for the role with the stored override applied.
///
/// Built fresh for every call; overrides never touch the shared defaults.
fn resolve_permissions(role: &ProjectRole) -> PermissionMap {
    let mut perms = Role::from_str(&role.role)
        .map(default_section_permissions)
        .unwrap_or_default();

    if let Some(raw) = role.permissions.as_deref() {
        match serde_json::from_str::<PermissionMap>(raw) {
            Ok(custom) => perms.extend(custom),
            Err(err) => warn!(
                role_id = role.id,
                "ignoring malformed permission override: {err}"
            ),
        }
    }
    perms
}

/// Check a project-level action against the coarse role table.
pub fn check_role_permission(
    db: &Database,
    user_id: i64,
    project_id: i64,
    action: &str,
) -> ServiceResult<()> {
    let role = role_for(db, user_id, project_id)?;
    let allowed = Role::from_str(&role.role)
        .map(role_actions)
        .unwrap_or_default();
    if !allowed.iter().any(|a| *a == action) {
        debug!(user_id, project_id, action, role = %role.role, "permission denied");
        return Err(ServiceError::forbidden(format!(
            "Role '{}' does not permit '{action}' action",
            role.role
        )));
    }
    Ok(())
}

/// Check an action within one section against the granular table.
pub fn check_section_permission(
    db: &Database,
    user_id: i64,
    project_id: i64,
    section: &str,
    action: &str,
) -> ServiceResult<()> {
    let role = role_for(db, user_id, project_id)?;
    let perms = resolve_permissions(&role);
    let allowed = perms
        .get(section)
        .is_some_and(|actions| actions.iter().any(|a| a == action));
    if !allowed {
        debug!(user_id, project_id, section, action, role = %role.role, "permission denied");
        return Err(ServiceError::forbidden(format!(
            "Role '{}' does not permit '{action}' in '{section}'",
            role.role
        )));
    }
    Ok(())
}

/// The user's effective section → actions map on the project.
pub fn effective_permissions(
    db: &Database,
    project_id: i64,
    user_id: i64,
) -> ServiceResult<PermissionMap> {
    let role = role_for(db, user_id, project_id)?;
    Ok(resolve_permissions(&role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignRoleInput, CreateProjectInput, CreateUserInput};
    use crate::services::projects::create_project;
    use crate::services::users::{assign_role, create_user};

    fn setup(role: &str, permissions: Option<&str>) -> (Database, i64, i64) {
        let db = Database::open_memory().unwrap();
        let project_id = create_project(
            &db,
            CreateProjectInput {
                name: "Apollo".into(),
                key: "APL".into(),
                ..Default::default()
            },
        )
        .unwrap()
        .project
        .id;
        let user_id = create_user(
            &db,
            CreateUserInput {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                settings: None,
            },
        )
        .unwrap()
        .id;
        assign_role(
            &db,
            project_id,
            AssignRoleInput {
                user_id,
                role: role.into(),
                permissions: permissions.map(str::to_string),
            },
        )
        .unwrap();
        (db, project_id, user_id)
    }

    #[test]
    fn coarse_table_by_role() {
        let (db, project_id, user_id) = setup("Member", None);
        assert!(check_role_permission(&db, user_id, project_id, "update").is_ok());
        assert!(matches!(
            check_role_permission(&db, user_id, project_id, "delete"),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn missing_role_is_forbidden() {
        let (db, project_id, _) = setup("Admin", None);
        let err = check_section_permission(&db, 999, project_id, "tasks", "view").unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(ref m) if m == "No role assigned for this project"));
    }

    #[test]
    fn override_replaces_named_sections_only() {
        let (db, project_id, user_id) =
            setup("Viewer", Some(r#"{"sprints": ["create", "view"]}"#));
        assert!(check_section_permission(&db, user_id, project_id, "sprints", "create").is_ok());
        assert!(check_section_permission(&db, user_id, project_id, "tasks", "update").is_err());

        let perms = effective_permissions(&db, project_id, user_id).unwrap();
        assert_eq!(perms["sprints"], vec!["create", "view"]);
        assert_eq!(perms["tasks"], vec!["view"]);
    }

    #[test]
    fn override_does_not_leak_into_defaults() {
        let (db, project_id, user_id) =
            setup("Viewer", Some(r#"{"tasks": ["delete"]}"#));
        check_section_permission(&db, user_id, project_id, "tasks", "delete").unwrap();
        assert_eq!(default_section_permissions(Role::Viewer)["tasks"], vec!["view"]);
    }

    #[test]
    fn every_role_covers_every_section() {
        for role in [Role::Admin, Role::Member, Role::Viewer] {
            let perms = default_section_permissions(role);
            for section in SECTIONS {
                assert!(perms[section].iter().any(|a| a == "view"));
            }
        }
    }
}
