use speculate2::speculate;

speculate! {
    use chrono::NaiveDate;
    use serde_json::json;

    use scrumboard_core::models::{
        AddUserToTeamInput, AssignRoleInput, CreateProjectInput, CreateSprintInput,
        CreateTeamInput, CreateUserInput, SprintState, StatusUpdateInput, UpsertConfigInput,
    };
    use scrumboard_core::services::{
        access, config, ingestion, reports, sprints, teams, users, work_items,
    };
    use scrumboard_core::{Database, ServiceError};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project(db: &Database, key: &str) -> i64 {
        scrumboard_core::services::projects::create_project(
            db,
            CreateProjectInput {
                name: format!("Project {key}"),
                key: key.to_string(),
                ..Default::default()
            },
        )
        .unwrap()
        .project
        .id
    }

    fn user(db: &Database, email: &str) -> i64 {
        users::create_user(
            db,
            CreateUserInput {
                name: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                ..Default::default()
            },
        )
        .unwrap()
        .id
    }

    before {
        let db = Database::open_memory().unwrap();
    }

    describe "ingestion into reports" {
        it "imports a csv and reports on the imported day" {
            let csv = "ID,Title,Assigned To,State,Activated Date,Closed Date,Criticality,Risk Item\n\
                       T-1,Login page,alice,Closed,2024-03-01,2024-03-04,High,\n\
                       T-2,Signup,bob,Active,2024-03-04,,Low,Vendor API unstable\n";
            let ingested = ingestion::import_bytes(&db, csv.as_bytes(), "board.csv").unwrap();
            assert_eq!(ingested, 2);

            let report = reports::get_daily_report(&db, Some(date(2024, 3, 4))).unwrap();
            assert_eq!(report.status_distribution.get("Closed"), Some(&1));
            assert_eq!(report.status_distribution.get("Active"), Some(&1));
            assert_eq!(report.closed_today.len(), 1);
            assert_eq!(report.closed_today[0].task_id, "T-1");
            assert_eq!(report.activated_today[0].task_id, "T-2");
            assert_eq!(report.risks_last_24h.len(), 1);
        }

        it "re-importing a task id updates instead of duplicating" {
            let first = "Task ID,State\nT-9,New\n";
            let second = "Task ID,State\nT-9,Active\n";
            ingestion::import_bytes(&db, first.as_bytes(), "a.csv").unwrap();
            ingestion::import_bytes(&db, second.as_bytes(), "b.csv").unwrap();

            let tasks = work_items::list_tasks(&db).unwrap();
            assert_eq!(tasks.len(), 1);
            assert_eq!(tasks[0].state.as_deref(), Some("Active"));
        }

        it "rejects unsupported file types" {
            let err = ingestion::import_bytes(&db, b"hello", "notes.txt").unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
        }

        it "status updates on imported tasks land in history" {
            ingestion::import_bytes(&db, b"TaskID,Title\nT-5,Thing\n", "t.csv").unwrap();
            work_items::update_status(
                &db,
                "T-5",
                StatusUpdateInput {
                    current_status: Some("On track".into()),
                    update_date: Some(date(2024, 5, 2)),
                    ..Default::default()
                },
            )
            .unwrap();

            let history = work_items::get_history(&db, "T-5").unwrap();
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].update_date, date(2024, 5, 2));
        }
    }

    describe "sprint lifecycle" {
        it "keeps at most one active sprint per project" {
            let project_id = project(&db, "ONE");
            let new_sprint = |name: &str| {
                sprints::create_sprint(
                    &db,
                    project_id,
                    CreateSprintInput { name: name.into(), ..Default::default() },
                )
                .unwrap()
            };
            let first = new_sprint("Sprint 1");
            let second = new_sprint("Sprint 2");

            sprints::activate_sprint(&db, first.id).unwrap();
            sprints::activate_sprint(&db, second.id).unwrap();

            let states: Vec<SprintState> = sprints::list_sprints(&db, project_id)
                .unwrap()
                .into_iter()
                .map(|s| s.state)
                .collect();
            assert_eq!(
                states.iter().filter(|s| **s == SprintState::Active).count(),
                1
            );
            assert_eq!(
                sprints::require_sprint(&db, first.id).unwrap().state,
                SprintState::Completed
            );

            let err = sprints::activate_sprint(&db, first.id).unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
        }
    }

    describe "access control" {
        it "viewers cannot create sprints" {
            let project_id = project(&db, "ACL");
            let user_id = user(&db, "viewer@example.com");
            users::assign_role(
                &db,
                project_id,
                AssignRoleInput { user_id, role: "Viewer".into(), permissions: None },
            )
            .unwrap();

            let err = access::check_section_permission(&db, user_id, project_id, "sprints", "create")
                .unwrap_err();
            assert!(matches!(err, ServiceError::Forbidden(_)));
            assert!(access::check_section_permission(&db, user_id, project_id, "sprints", "view").is_ok());
        }

        it "overrides replace only the sections they name" {
            let project_id = project(&db, "OVR");
            let user_id = user(&db, "admin@example.com");
            users::assign_role(
                &db,
                project_id,
                AssignRoleInput {
                    user_id,
                    role: "Admin".into(),
                    permissions: Some(json!({"sprints": ["view"]}).to_string()),
                },
            )
            .unwrap();

            assert!(access::check_section_permission(&db, user_id, project_id, "sprints", "create").is_err());
            assert!(access::check_section_permission(&db, user_id, project_id, "tasks", "create").is_ok());

            let perms = access::effective_permissions(&db, project_id, user_id).unwrap();
            assert_eq!(perms["sprints"], vec!["view".to_string()]);
        }

        it "users without a role are denied" {
            let project_id = project(&db, "NOR");
            let user_id = user(&db, "nobody@example.com");
            let err = access::check_role_permission(&db, user_id, project_id, "view").unwrap_err();
            assert!(matches!(err, ServiceError::Forbidden(_)));
        }
    }

    describe "team based access" {
        it "restricts a project to members of assigned teams" {
            let project_id = project(&db, "TEAM");
            let outsider = user(&db, "outsider@example.com");
            assert!(teams::can_user_access_project(&db, outsider, project_id).unwrap());

            let team = teams::create_team(
                &db,
                CreateTeamInput { name: "Platform".into(), description: None },
            )
            .unwrap();
            let member = teams::add_user_to_team(
                &db,
                team.id,
                AddUserToTeamInput {
                    name: Some("Dana".into()),
                    email: Some("dana@example.com".into()),
                    team_role: Some("Lead".into()),
                    ..Default::default()
                },
            )
            .unwrap();
            teams::assign_team_to_project(&db, project_id, team.id).unwrap();

            assert!(teams::can_user_access_project(&db, member.user_id, project_id).unwrap());
            assert!(!teams::can_user_access_project(&db, outsider, project_id).unwrap());
            assert!(!teams::check_project_access(&db, project_id, outsider).unwrap().allowed);
        }
    }

    describe "config resolution" {
        it "layers org overrides over global overrides over defaults" {
            config::upsert_config(
                &db,
                UpsertConfigInput {
                    org_id: None,
                    config_key: "methodologies".into(),
                    value: json!(["Scrum"]),
                },
            )
            .unwrap();
            config::upsert_config(
                &db,
                UpsertConfigInput {
                    org_id: Some(7),
                    config_key: "methodologies".into(),
                    value: json!(["Kanban"]),
                },
            )
            .unwrap();

            assert_eq!(config::resolve_config(&db, None).unwrap()["methodologies"], json!(["Scrum"]));
            assert_eq!(config::resolve_config(&db, Some(7)).unwrap()["methodologies"], json!(["Kanban"]));
            assert_eq!(config::resolve_config(&db, Some(8)).unwrap()["methodologies"], json!(["Scrum"]));

            config::reset_config(&db, "methodologies", Some(7)).unwrap();
            assert_eq!(config::resolve_config(&db, Some(7)).unwrap()["methodologies"], json!(["Scrum"]));
        }
    }
}
