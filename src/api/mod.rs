//! HTTP API.
//!
//! Handlers are thin: extract, call into [`crate::services`], serialize.
//! Failures surface as [`ApiError`], which maps service errors to status
//! codes with a `{"error": ...}` body.

mod caller;
mod config;
mod error;
mod imports;
mod organizations;
mod projects;
mod reports;
mod retrospectives;
mod roles;
mod sprints;
mod tasks;
mod teams;
mod users;

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::Database;

pub use caller::{Caller, USER_ID_HEADER};
pub use error::{ApiError, ApiResult, ErrorResponse};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub fn create_router(db: Database) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Config
        .route("/config", get(config::get_config).post(config::upsert_config))
        .route("/config/defaults", get(config::get_defaults))
        .route("/config/{config_key}", axum::routing::delete(config::reset_config))
        // Import / export
        .route("/import", post(imports::import_file))
        .route("/export/excel", get(tasks::export_excel))
        // Organizations
        .route(
            "/organizations",
            get(organizations::list_organizations).post(organizations::create_organization),
        )
        .route(
            "/organizations/{id}",
            get(organizations::get_organization)
                .patch(organizations::update_organization)
                .delete(organizations::delete_organization),
        )
        // Projects
        .route("/projects", get(projects::list_projects).post(projects::create_project))
        .route(
            "/projects/{id}",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/projects/{id}/team_members",
            get(projects::list_team_members).post(projects::add_team_member),
        )
        .route(
            "/projects/{id}/team_members/{member_id}",
            patch(projects::update_team_member).delete(projects::remove_team_member),
        )
        .route(
            "/projects/{id}/sprints",
            get(sprints::list_sprints).post(sprints::create_sprint),
        )
        .route("/projects/{id}/roles", get(roles::list_roles).post(roles::assign_role))
        .route("/projects/{id}/roles/{user_id}", get(roles::get_user_role))
        .route(
            "/projects/{id}/permissions/{user_id}",
            get(roles::get_permissions),
        )
        .route("/projects/{id}/teams", get(teams::list_project_teams))
        .route(
            "/projects/{id}/teams/{team_id}",
            post(teams::assign_team).delete(teams::unassign_team),
        )
        .route("/projects/{id}/access/{user_id}", get(teams::check_access))
        // Sprints
        .route(
            "/sprints/{id}",
            get(sprints::get_sprint)
                .patch(sprints::update_sprint)
                .delete(sprints::delete_sprint),
        )
        .route("/sprints/{id}/activate", post(sprints::activate_sprint))
        .route("/sprints/{id}/complete", post(sprints::complete_sprint))
        .route(
            "/sprints/{id}/retrospective",
            get(retrospectives::get_retrospective)
                .post(retrospectives::create_retrospective)
                .patch(retrospectives::update_retrospective)
                .delete(retrospectives::delete_retrospective),
        )
        // Roles
        .route(
            "/roles/{id}",
            patch(roles::update_role).delete(roles::delete_role),
        )
        // Reports
        .route("/reports/daily", get(reports::daily))
        .route("/reports/weekly", get(reports::weekly))
        .route("/reports/monthly", get(reports::monthly))
        // Tasks / work items
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks/{task_id}", patch(tasks::update_status))
        .route("/tasks/{task_id}/updates", get(tasks::list_updates))
        .route(
            "/workitems",
            get(tasks::list_work_items).post(tasks::create_work_item),
        )
        .route(
            "/workitems/{task_id}",
            get(tasks::get_work_item)
                .patch(tasks::update_work_item)
                .delete(tasks::delete_work_item),
        )
        .route("/workitems/{task_id}/children", get(tasks::list_children))
        // Teams
        .route("/teams", get(teams::list_teams).post(teams::create_team))
        .route(
            "/teams/{id}",
            get(teams::get_team)
                .patch(teams::update_team)
                .delete(teams::delete_team),
        )
        .route(
            "/teams/{id}/members",
            get(teams::list_members).post(teams::add_member),
        )
        .route("/teams/{id}/members/{user_id}", axum::routing::delete(teams::remove_member))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_router() -> Router {
        create_router(Database::open_memory().unwrap())
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn missing_project_is_404_with_error_body() {
        let req = Request::builder()
            .uri("/projects/42")
            .body(Body::empty())
            .unwrap();
        let resp = test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn malformed_user_header_is_rejected() {
        let req = Request::builder()
            .method("DELETE")
            .uri("/projects/1")
            .header(USER_ID_HEADER, "not-a-number")
            .body(Body::empty())
            .unwrap();
        let resp = test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
