use tracing::{debug, info};

use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{CreateOrganizationInput, Organization, UpdateOrganizationInput};

pub fn list_organizations(db: &Database) -> ServiceResult<Vec<Organization>> {
    let orgs = db.get_organizations()?;
    debug!(count = orgs.len(), "listed organizations");
    Ok(orgs)
}

pub fn get_organization(db: &Database, id: i64) -> ServiceResult<Organization> {
    db.get_organization(id)?
        .ok_or_else(|| ServiceError::not_found("Organization"))
}

pub fn create_organization(
    db: &Database,
    input: CreateOrganizationInput,
) -> ServiceResult<Organization> {
    if input.name.trim().is_empty() || input.slug.trim().is_empty() {
        return Err(ServiceError::invalid("Organization name and slug are required"));
    }
    if db.get_organization_by_slug(&input.slug)?.is_some() {
        return Err(ServiceError::conflict("Slug already exists"));
    }
    let org = db.create_organization(input)?;
    info!(id = org.id, slug = %org.slug, "created organization");
    Ok(org)
}

pub fn update_organization(
    db: &Database,
    id: i64,
    input: UpdateOrganizationInput,
) -> ServiceResult<Organization> {
    get_organization(db, id)?;
    if let Some(slug) = input.slug.as_deref() {
        if let Some(existing) = db.get_organization_by_slug(slug)? {
            if existing.id != id {
                return Err(ServiceError::conflict("Slug already exists"));
            }
        }
    }
    db.update_organization(id, input)?;
    info!(id, "updated organization");
    get_organization(db, id)
}

/// Projects of a deleted organization are kept, detached from it.
pub fn delete_organization(db: &Database, id: i64) -> ServiceResult<()> {
    if !db.delete_organization(id)? {
        return Err(ServiceError::not_found("Organization"));
    }
    info!(id, "deleted organization");
    Ok(())
}
