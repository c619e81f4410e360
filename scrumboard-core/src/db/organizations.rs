use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::models::{
    CreateOrganizationInput, Organization, UpdateOrganizationInput, DEFAULT_THEME_COLOR,
};

const COLUMNS: &str = "id, name, slug, logo_url, theme_color, settings, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Organization> {
    Ok(Organization {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        logo_url: row.get(3)?,
        theme_color: row.get(4)?,
        settings: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Database {
    pub fn get_organizations(&self) -> Result<Vec<Organization>> {
        self.with_connection(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {COLUMNS} FROM organizations ORDER BY name"))?;
            let orgs = stmt
                .query_map([], from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(orgs)
        })
    }

    pub fn get_organization(&self, id: i64) -> Result<Option<Organization>> {
        self.with_connection(|conn| {
            let org = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM organizations WHERE id = ?1"),
                    [id],
                    from_row,
                )
                .optional()?;
            Ok(org)
        })
    }

    pub fn get_organization_by_slug(&self, slug: &str) -> Result<Option<Organization>> {
        self.with_connection(|conn| {
            let org = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM organizations WHERE slug = ?1"),
                    [slug],
                    from_row,
                )
                .optional()?;
            Ok(org)
        })
    }

    pub fn create_organization(&self, input: CreateOrganizationInput) -> Result<Organization> {
        let now = Utc::now();
        let id = self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO organizations (name, slug, logo_url, theme_color, settings, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    input.name,
                    input.slug,
                    input.logo_url,
                    input.theme_color.as_deref().unwrap_or(DEFAULT_THEME_COLOR),
                    input.settings,
                    now,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        self.get_organization(id)?
            .ok_or_else(|| anyhow::anyhow!("organization {id} vanished after insert"))
    }

    pub fn update_organization(&self, id: i64, input: UpdateOrganizationInput) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE organizations SET
                    name = COALESCE(?2, name),
                    slug = COALESCE(?3, slug),
                    logo_url = COALESCE(?4, logo_url),
                    theme_color = COALESCE(?5, theme_color),
                    settings = COALESCE(?6, settings),
                    updated_at = ?7
                 WHERE id = ?1",
                params![
                    id,
                    input.name,
                    input.slug,
                    input.logo_url,
                    input.theme_color,
                    input.settings,
                    Utc::now(),
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_organization(&self, id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute("DELETE FROM organizations WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}
