use crate::models::{Destination, Endpoint};
use crate::services::registry::{
    destination_from_row, endpoint_from_row, DESTINATION_COLUMNS, ENDPOINT_COLUMNS,
};
use crate::Database;
use rusqlite::OptionalExtension;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Endpoint '{0}' not found")]
    NotFound(String),
    #[error("Endpoint '{}' is inactive", .0.slug)]
    Inactive(Box<Endpoint>),
    #[error("Failed to read endpoint configuration: {0}")]
    Store(#[from] anyhow::Error),
}

/// An endpoint together with the destinations that were active when it was read.
/// The destination list is frozen: later configuration edits do not reach it.
#[derive(Debug, Clone)]
pub struct ResolvedEndpoint {
    pub endpoint: Endpoint,
    pub destinations: Arc<[Destination]>,
}

enum Lookup<'a> {
    Slug(&'a str),
    Id(i64),
}

/// Resolve an inbound slug to an active endpoint and its ordered active destinations.
pub fn resolve(db: &Database, slug: &str) -> Result<ResolvedEndpoint, ResolveError> {
    let resolved =
        read_snapshot(db, Lookup::Slug(slug))?.ok_or_else(|| ResolveError::NotFound(slug.to_string()))?;

    if !resolved.endpoint.active {
        return Err(ResolveError::Inactive(Box::new(resolved.endpoint)));
    }

    Ok(resolved)
}

/// Resolve by id for manual test deliveries. Inactive endpoints are returned as-is so they can
/// be exercised before being switched on.
pub fn resolve_by_id(db: &Database, id: i64) -> Result<ResolvedEndpoint, ResolveError> {
    read_snapshot(db, Lookup::Id(id))?.ok_or_else(|| ResolveError::NotFound(id.to_string()))
}

fn read_snapshot(db: &Database, lookup: Lookup<'_>) -> anyhow::Result<Option<ResolvedEndpoint>> {
    let mut conn = db.get()?;
    // Both reads happen inside one transaction so they observe the same database state.
    let tx = conn.transaction()?;

    let endpoint = match lookup {
        Lookup::Slug(slug) => tx
            .query_row(
                &format!("SELECT {} FROM endpoints WHERE slug = ?1", ENDPOINT_COLUMNS),
                [slug],
                endpoint_from_row,
            )
            .optional()?,
        Lookup::Id(id) => tx
            .query_row(
                &format!("SELECT {} FROM endpoints WHERE id = ?1", ENDPOINT_COLUMNS),
                [id],
                endpoint_from_row,
            )
            .optional()?,
    };

    let Some(endpoint) = endpoint else {
        return Ok(None);
    };

    let destinations = {
        let mut stmt = tx.prepare(&format!(
            "SELECT {} FROM destinations WHERE endpoint_id = ?1 AND active = 1 ORDER BY position, id",
            DESTINATION_COLUMNS
        ))?;
        let rows = stmt
            .query_map([endpoint.id], destination_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    tx.commit()?;

    tracing::debug!(
        "Resolved endpoint '{}' with {} active destination(s)",
        endpoint.slug,
        destinations.len()
    );

    Ok(Some(ResolvedEndpoint {
        endpoint,
        destinations: destinations.into(),
    }))
}
