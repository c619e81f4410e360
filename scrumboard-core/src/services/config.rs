//! Layered application configuration.
//!
//! Effective config = built-in defaults, then global rows (`org_id` NULL),
//! then the organization's own rows, key by key.

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{AppConfig, ConfigUpsertResult, UpsertConfigInput};

/// Built-in configuration. Every overridable key appears here.
pub fn defaults() -> Map<String, Value> {
    let value = json!({
        "work_item_types": ["Epic", "Feature", "User Story", "Task", "Bug"],
        "work_item_states": ["New", "Active", "Resolved", "Closed"],
        "priorities": [
            {"value": 1, "label": "1 – Critical", "color": "#cc293d"},
            {"value": 2, "label": "2 – High", "color": "#ca5010"},
            {"value": 3, "label": "3 – Medium", "color": "#d9a800"},
            {"value": 4, "label": "4 – Low", "color": "#a19f9d"}
        ],
        "methodologies": ["Scrum", "Kanban", "SAFe", "XP", "Lean"],
        "sprint_states": ["planning", "active", "completed"],
        "project_states": ["active", "archived", "planning"],
        "criticality_levels": ["Critical", "High", "Medium", "Low"],
        "sub_states": ["In Progress", "Blocked", "In Review", "Testing", "Done"],
        "preset_colors": [
            "#0078d4", "#107c10", "#ca5010", "#8764b8",
            "#038387", "#d9a800", "#e3008c", "#605e5c"
        ],
        "preset_icons": ["📁", "🚀", "⚡", "🔥", "💡", "🎯", "🛠️", "🌐", "📱", "🏆"],
        "type_hierarchy": {
            "Epic": null,
            "Feature": "Epic",
            "User Story": "Feature",
            "Task": "User Story",
            "Bug": "User Story"
        }
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn overlay(target: &mut Map<String, Value>, row: &AppConfig) {
    match serde_json::from_str::<Value>(&row.value) {
        Ok(value) => {
            target.insert(row.config_key.clone(), value);
        }
        Err(err) => warn!(
            key = %row.config_key,
            org_id = ?row.org_id,
            "skipping config row with malformed JSON: {err}"
        ),
    }
}

pub fn resolve_config(db: &Database, org_id: Option<i64>) -> ServiceResult<Map<String, Value>> {
    let rows = db.get_config_rows(org_id)?;
    let mut config = defaults();

    for row in rows.iter().filter(|r| r.org_id.is_none()) {
        overlay(&mut config, row);
    }
    if org_id.is_some() {
        for row in rows.iter().filter(|r| r.org_id.is_some()) {
            overlay(&mut config, row);
        }
    }

    debug!(?org_id, overrides = rows.len(), "resolved config");
    Ok(config)
}

pub fn upsert_config(db: &Database, input: UpsertConfigInput) -> ServiceResult<ConfigUpsertResult> {
    if !defaults().contains_key(&input.config_key) {
        return Err(ServiceError::invalid(format!(
            "Unknown config key: {}",
            input.config_key
        )));
    }

    let encoded = serde_json::to_string(&input.value).map_err(anyhow::Error::from)?;
    db.upsert_config_row(input.org_id, &input.config_key, &encoded)?;
    info!(key = %input.config_key, org_id = ?input.org_id, "config override saved");

    Ok(ConfigUpsertResult {
        status: "ok".to_string(),
        config_key: input.config_key,
        value: input.value,
    })
}

/// Remove an override. A missing row is not an error.
pub fn reset_config(db: &Database, config_key: &str, org_id: Option<i64>) -> ServiceResult<()> {
    if db.delete_config_row(org_id, config_key)? {
        info!(key = %config_key, ?org_id, "config override removed");
    }
    Ok(())
}

/// Write every default as a global row unless one already exists.
///
/// Returns the number of rows inserted.
pub fn seed_global_defaults(db: &Database) -> ServiceResult<usize> {
    let mut inserted = 0;
    for (key, value) in defaults() {
        if db.get_config_row(None, &key)?.is_some() {
            continue;
        }
        let encoded = serde_json::to_string(&value).map_err(anyhow::Error::from)?;
        db.upsert_config_row(None, &key, &encoded)?;
        inserted += 1;
    }
    info!(inserted, "seeded global config defaults");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(db: &Database, org_id: Option<i64>, key: &str, value: Value) {
        upsert_config(
            db,
            UpsertConfigInput {
                org_id,
                config_key: key.to_string(),
                value,
            },
        )
        .unwrap();
    }

    #[test]
    fn defaults_cover_all_keys() {
        let d = defaults();
        for key in [
            "work_item_types",
            "work_item_states",
            "priorities",
            "methodologies",
            "sprint_states",
            "project_states",
            "criticality_levels",
            "sub_states",
            "preset_colors",
            "preset_icons",
            "type_hierarchy",
        ] {
            assert!(d.contains_key(key), "missing default {key}");
        }
        assert_eq!(d["type_hierarchy"]["Epic"], Value::Null);
        assert_eq!(d["type_hierarchy"]["Bug"], json!("User Story"));
    }

    #[test]
    fn org_overrides_win_over_global_overrides() {
        let db = Database::open_memory().unwrap();
        set(&db, None, "methodologies", json!(["Scrum"]));
        set(&db, None, "sub_states", json!(["Blocked"]));
        set(&db, Some(7), "methodologies", json!(["Kanban"]));

        let org = resolve_config(&db, Some(7)).unwrap();
        assert_eq!(org["methodologies"], json!(["Kanban"]));
        assert_eq!(org["sub_states"], json!(["Blocked"]));
        assert_eq!(org["work_item_states"], defaults()["work_item_states"]);

        let global = resolve_config(&db, None).unwrap();
        assert_eq!(global["methodologies"], json!(["Scrum"]));

        let other_org = resolve_config(&db, Some(8)).unwrap();
        assert_eq!(other_org["methodologies"], json!(["Scrum"]));
    }

    #[test]
    fn reset_reverts_to_lower_layer() {
        let db = Database::open_memory().unwrap();
        set(&db, None, "methodologies", json!(["XP"]));
        set(&db, Some(1), "methodologies", json!(["Lean"]));

        reset_config(&db, "methodologies", Some(1)).unwrap();
        assert_eq!(resolve_config(&db, Some(1)).unwrap()["methodologies"], json!(["XP"]));

        reset_config(&db, "methodologies", None).unwrap();
        assert_eq!(
            resolve_config(&db, Some(1)).unwrap()["methodologies"],
            defaults()["methodologies"]
        );

        // removing something that is not there is fine
        reset_config(&db, "methodologies", None).unwrap();
    }

    #[test]
    fn unknown_key_is_rejected() {
        let db = Database::open_memory().unwrap();
        let err = upsert_config(
            &db,
            UpsertConfigInput {
                org_id: None,
                config_key: "colour_scheme".into(),
                value: json!("dark"),
            },
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(ref m) if m == "Unknown config key: colour_scheme"));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let db = Database::open_memory().unwrap();
        db.upsert_config_row(None, "methodologies", "{not json").unwrap();
        let config = resolve_config(&db, None).unwrap();
        assert_eq!(config["methodologies"], defaults()["methodologies"]);
    }

    #[test]
    fn seeding_skips_existing_rows() {
        let db = Database::open_memory().unwrap();
        set(&db, None, "methodologies", json!(["XP"]));
        let inserted = seed_global_defaults(&db).unwrap();
        assert_eq!(inserted, defaults().len() - 1);
        assert_eq!(resolve_config(&db, None).unwrap()["methodologies"], json!(["XP"]));
        assert_eq!(seed_global_defaults(&db).unwrap(), 0);
    }
}
