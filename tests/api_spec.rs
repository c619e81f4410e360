use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};

use scrumboard::{api, Database};

fn server() -> TestServer {
    let db = Database::open_memory().unwrap();
    TestServer::new(api::create_router(db)).unwrap()
}

fn as_user(id: i64) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(api::USER_ID_HEADER),
        HeaderValue::from_str(&id.to_string()).unwrap(),
    )
}

async fn create_project(server: &TestServer, key: &str) -> i64 {
    let resp = server
        .post("/projects")
        .json(&json!({"name": "Scrum board", "key": key}))
        .await;
    resp.assert_status(StatusCode::CREATED);
    resp.json::<Value>()["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_check_is_healthy() {
    let resp = server().get("/health").await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn config_override_and_reset() {
    let server = server();

    server
        .post("/config")
        .json(&json!({"org_id": 3, "config_key": "sub_states", "value": ["Blocked"]}))
        .await
        .assert_status_ok();

    let org = server.get("/config").add_query_param("org_id", 3).await;
    assert_eq!(org.json::<Value>()["sub_states"], json!(["Blocked"]));

    let global = server.get("/config").await;
    assert_ne!(global.json::<Value>()["sub_states"], json!(["Blocked"]));

    server
        .delete("/config/sub_states")
        .add_query_param("org_id", 3)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let reset = server.get("/config").add_query_param("org_id", 3).await;
    assert_eq!(reset.json::<Value>()["sub_states"], global.json::<Value>()["sub_states"]);
}

#[tokio::test]
async fn unknown_config_key_is_bad_request() {
    let resp = server()
        .post("/config")
        .json(&json!({"config_key": "nope", "value": 1}))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>()["error"], "Unknown config key: nope");
}

#[tokio::test]
async fn duplicate_project_key_conflicts() {
    let server = server();
    create_project(&server, "DUP").await;

    let resp = server
        .post("/projects")
        .json(&json!({"name": "Other", "key": "dup"}))
        .await;
    resp.assert_status(StatusCode::CONFLICT);
    assert_eq!(resp.json::<Value>()["error"], "Project key already exists");
}

#[tokio::test]
async fn activating_a_sprint_completes_the_previous_one() {
    let server = server();
    let project_id = create_project(&server, "SPR").await;

    let mut ids = Vec::new();
    for name in ["Sprint 1", "Sprint 2"] {
        let resp = server
            .post(&format!("/projects/{project_id}/sprints"))
            .json(&json!({"name": name}))
            .await;
        resp.assert_status(StatusCode::CREATED);
        ids.push(resp.json::<Value>()["id"].as_i64().unwrap());
    }

    server.post(&format!("/sprints/{}/activate", ids[0])).await.assert_status_ok();
    let second = server.post(&format!("/sprints/{}/activate", ids[1])).await;
    assert_eq!(second.json::<Value>()["state"], "active");

    let first = server.get(&format!("/sprints/{}", ids[0])).await;
    assert_eq!(first.json::<Value>()["state"], "completed");

    let project = server.get(&format!("/projects/{project_id}")).await;
    assert_eq!(project.json::<Value>()["active_sprint"], "Sprint 2");
}

#[tokio::test]
async fn viewer_cannot_create_sprints() {
    let server = server();
    let project_id = create_project(&server, "ACL").await;

    let user = server
        .post("/users")
        .json(&json!({"name": "Vic", "email": "vic@example.com"}))
        .await;
    let user_id = user.json::<Value>()["id"].as_i64().unwrap();
    server
        .post(&format!("/projects/{project_id}/roles"))
        .json(&json!({"user_id": user_id, "role": "Viewer"}))
        .await
        .assert_status(StatusCode::CREATED);

    let (name, value) = as_user(user_id);
    let resp = server
        .post(&format!("/projects/{project_id}/sprints"))
        .add_header(name, value)
        .json(&json!({"name": "Sneaky"}))
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);

    let perms = server
        .get(&format!("/projects/{project_id}/permissions/{user_id}"))
        .await;
    assert_eq!(perms.json::<Value>()["permissions"]["sprints"], json!(["view"]));
}

#[tokio::test]
async fn import_then_export() {
    let server = server();
    let csv = "TaskID,Title,State,Assigned To\nT-1,First,Active,alice\nT-2,Second,New,bob\n";
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(csv.as_bytes().to_vec())
            .file_name("tasks.csv")
            .mime_type("text/csv"),
    );

    let resp = server.post("/import").multipart(form).await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["ingested"], 2);

    let tasks = server.get("/tasks").await.json::<Value>();
    assert_eq!(tasks.as_array().unwrap().len(), 2);

    let export = server.get("/export/excel").await;
    export.assert_status_ok();
    let disposition = export.header("content-disposition");
    assert_eq!(
        disposition.to_str().unwrap(),
        "attachment; filename=scrum_report.xlsx"
    );
    assert!(export.as_bytes().starts_with(b"PK"));
}

#[tokio::test]
async fn import_without_file_field_is_bad_request() {
    let form = MultipartForm::new().add_text("note", "no file here");
    let resp = server().post("/import").multipart(form).await;
    resp.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn work_item_ids_follow_type_prefix() {
    let server = server();
    let resp = server
        .post("/workitems")
        .json(&json!({"title": "Checkout epic", "work_item_type": "Epic"}))
        .await;
    resp.assert_status(StatusCode::CREATED);
    let task_id = resp.json::<Value>()["task_id"].as_str().unwrap().to_string();
    assert!(task_id.starts_with("EPIC-"));

    let child = server
        .post("/workitems")
        .json(&json!({"title": "Payment feature", "work_item_type": "Feature", "parent_task_id": task_id}))
        .await;
    child.assert_status(StatusCode::CREATED);

    let children = server.get(&format!("/workitems/{task_id}/children")).await;
    assert_eq!(children.json::<Value>().as_array().unwrap().len(), 1);

    let missing = server.get("/workitems/NOPE-1/children").await;
    missing.assert_status_not_found();
}
