use crate::models::{Endpoint, NewDestination};
use crate::services::registry;
use crate::services::slug::generate_slug;
use crate::{Config, Database};
use anyhow::Result;
use std::path::Path;

use super::{DestinationCommand, EndpointCommand};

fn open(config_path: &Path) -> Result<Database> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path, config.database.pool_size)?;
    db.migrate()?;
    Ok(db)
}

fn require_endpoint(db: &Database, slug: &str) -> Result<Endpoint> {
    registry::get_endpoint_by_slug(db, slug)?
        .ok_or_else(|| anyhow::anyhow!("Endpoint '{}' not found", slug))
}

pub async fn run(config_path: &Path, command: EndpointCommand) -> Result<()> {
    let db = open(config_path)?;

    match command {
        EndpointCommand::Add {
            name,
            slug,
            description,
        } => {
            let slug = slug.unwrap_or_else(|| generate_slug(&name));
            let id = registry::create_endpoint(&db, &slug, &name, &description)?;
            tracing::info!("Endpoint '{}' created (id {})", slug, id);
        }
        EndpointCommand::List => {
            let endpoints = registry::list_endpoints(&db)?;

            println!("{:<6} {:<24} {:<30} {:<8} {:<12}", "ID", "SLUG", "NAME", "ACTIVE", "DESTINATIONS");
            println!("{}", "-".repeat(84));
            for endpoint in endpoints {
                let destinations = registry::list_destinations(&db, endpoint.id)?;
                let active = destinations.iter().filter(|d| d.active).count();
                println!(
                    "{:<6} {:<24} {:<30} {:<8} {}/{}",
                    endpoint.id,
                    endpoint.slug,
                    endpoint.name,
                    if endpoint.active { "yes" } else { "no" },
                    active,
                    destinations.len()
                );
            }
        }
        EndpointCommand::Enable { slug } => {
            let endpoint = require_endpoint(&db, &slug)?;
            registry::set_endpoint_active(&db, endpoint.id, true)?;
            tracing::info!("Endpoint '{}' enabled", slug);
        }
        EndpointCommand::Disable { slug } => {
            let endpoint = require_endpoint(&db, &slug)?;
            registry::set_endpoint_active(&db, endpoint.id, false)?;
            tracing::info!("Endpoint '{}' disabled", slug);
        }
        EndpointCommand::Remove { slug } => {
            let endpoint = require_endpoint(&db, &slug)?;
            registry::delete_endpoint(&db, endpoint.id)?;
            tracing::info!("Endpoint '{}' removed", slug);
        }
    }

    Ok(())
}

pub async fn run_destination(config_path: &Path, command: DestinationCommand) -> Result<()> {
    let db = open(config_path)?;

    match command {
        DestinationCommand::Add {
            endpoint,
            name,
            url,
            order,
            timeout_ms,
            max_retries,
        } => {
            let owner = require_endpoint(&db, &endpoint)?;
            let id = registry::create_destination(
                &db,
                &NewDestination {
                    endpoint_id: owner.id,
                    name: name.clone(),
                    url,
                    position: order,
                    timeout_ms,
                    max_retries,
                },
            )?;
            tracing::info!("Destination '{}' added to '{}' (id {})", name, endpoint, id);
        }
        DestinationCommand::List { endpoint } => {
            let owner = require_endpoint(&db, &endpoint)?;
            let destinations = registry::list_destinations(&db, owner.id)?;

            println!("{:<6} {:<6} {:<24} {:<8} {:<10} URL", "ID", "ORDER", "NAME", "ACTIVE", "TIMEOUT");
            println!("{}", "-".repeat(90));
            for d in destinations {
                println!(
                    "{:<6} {:<6} {:<24} {:<8} {:<10} {}",
                    d.id,
                    d.position,
                    d.name,
                    if d.active { "yes" } else { "no" },
                    format!("{}ms", d.timeout_ms),
                    d.url
                );
            }
        }
        DestinationCommand::Enable { id } => {
            registry::set_destination_active(&db, id, true)?;
            tracing::info!("Destination {} enabled", id);
        }
        DestinationCommand::Disable { id } => {
            registry::set_destination_active(&db, id, false)?;
            tracing::info!("Destination {} disabled", id);
        }
    }

    Ok(())
}
