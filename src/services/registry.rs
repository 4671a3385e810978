//! Minimal endpoint/destination registry. The admin surface that normally owns these rows lives
//! elsewhere; this module gives the CLI and tests a way to populate and inspect them.

use crate::models::{Destination, Endpoint, NewDestination};
use crate::services::slug::validate_slug;
use crate::Database;
use anyhow::Result;
use rusqlite::{Row, TransactionBehavior};

pub(crate) const ENDPOINT_COLUMNS: &str =
    "id, slug, name, description, active, created_at, updated_at";

pub(crate) const DESTINATION_COLUMNS: &str =
    "id, endpoint_id, name, url, active, position, timeout_ms, max_retries";

pub(crate) fn endpoint_from_row(row: &Row<'_>) -> rusqlite::Result<Endpoint> {
    Ok(Endpoint {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub(crate) fn destination_from_row(row: &Row<'_>) -> rusqlite::Result<Destination> {
    Ok(Destination {
        id: row.get(0)?,
        endpoint_id: row.get(1)?,
        name: row.get(2)?,
        url: row.get(3)?,
        active: row.get(4)?,
        position: row.get(5)?,
        timeout_ms: row.get(6)?,
        max_retries: row.get(7)?,
    })
}

/// Create a new endpoint and return its id.
pub fn create_endpoint(db: &Database, slug: &str, name: &str, description: &str) -> Result<i64> {
    if !validate_slug(slug) {
        anyhow::bail!(
            "Invalid slug '{}': use lowercase letters, digits and '-' (max 200 characters)",
            slug
        );
    }

    let conn = db.get()?;
    conn.execute(
        "INSERT INTO endpoints (slug, name, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![slug, name, description],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_endpoint_active(db: &Database, id: i64, active: bool) -> Result<()> {
    let conn = db.get()?;
    let affected = conn.execute(
        "UPDATE endpoints SET active = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?2",
        rusqlite::params![active, id],
    )?;
    if affected == 0 {
        anyhow::bail!("Endpoint {} not found", id);
    }
    Ok(())
}

/// Delete an endpoint. Refused while any of its destinations is still active.
pub fn delete_endpoint(db: &Database, id: i64) -> Result<()> {
    let mut conn = db.get()?;
    // Take the write lock before the check so no destination can be enabled in between.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let active_destinations: i64 = tx.query_row(
        "SELECT COUNT(*) FROM destinations WHERE endpoint_id = ?1 AND active = 1",
        [id],
        |row| row.get(0),
    )?;
    if active_destinations > 0 {
        anyhow::bail!(
            "Endpoint {} still has {} active destination(s); disable them first",
            id,
            active_destinations
        );
    }

    let affected = tx.execute("DELETE FROM endpoints WHERE id = ?1", [id])?;
    if affected == 0 {
        anyhow::bail!("Endpoint {} not found", id);
    }
    tx.commit()?;
    Ok(())
}

pub fn list_endpoints(db: &Database) -> Result<Vec<Endpoint>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM endpoints ORDER BY slug",
        ENDPOINT_COLUMNS
    ))?;
    let endpoints = stmt
        .query_map([], endpoint_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(endpoints)
}

pub fn get_endpoint_by_slug(db: &Database, slug: &str) -> Result<Option<Endpoint>> {
    let conn = db.get()?;
    let endpoint = conn.query_row(
        &format!("SELECT {} FROM endpoints WHERE slug = ?1", ENDPOINT_COLUMNS),
        [slug],
        endpoint_from_row,
    );

    match endpoint {
        Ok(e) => Ok(Some(e)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Register a destination. Only absolute http(s) URLs are accepted.
pub fn create_destination(db: &Database, new: &NewDestination) -> Result<i64> {
    let parsed = url::Url::parse(&new.url)
        .map_err(|e| anyhow::anyhow!("Invalid destination URL '{}': {}", new.url, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("Destination URL must use http or https, got '{}'", parsed.scheme());
    }
    if new.timeout_ms < 0 {
        anyhow::bail!("timeout_ms must not be negative");
    }
    if new.max_retries < 0 {
        anyhow::bail!("max_retries must not be negative");
    }

    let conn = db.get()?;
    conn.execute(
        "INSERT INTO destinations (endpoint_id, name, url, position, timeout_ms, max_retries)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            new.endpoint_id,
            new.name,
            new.url,
            new.position,
            new.timeout_ms,
            new.max_retries,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_destination_active(db: &Database, id: i64, active: bool) -> Result<()> {
    let conn = db.get()?;
    let affected = conn.execute(
        "UPDATE destinations SET active = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?2",
        rusqlite::params![active, id],
    )?;
    if affected == 0 {
        anyhow::bail!("Destination {} not found", id);
    }
    Ok(())
}

/// All destinations of an endpoint, active or not, in configured order.
pub fn list_destinations(db: &Database, endpoint_id: i64) -> Result<Vec<Destination>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM destinations WHERE endpoint_id = ?1 ORDER BY position, id",
        DESTINATION_COLUMNS
    ))?;
    let destinations = stmt
        .query_map([endpoint_id], destination_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(destinations)
}
