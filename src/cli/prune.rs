use crate::services::delivery_log;
use crate::{Config, Database};
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path, days: Option<u32>) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path, config.database.pool_size)?;

    let days = days.unwrap_or(config.logs.retention_days);
    if days == 0 {
        tracing::warn!("Retention is 0 days (keep forever); nothing to prune");
        return Ok(());
    }

    let deleted = delivery_log::prune_events(&db, days)?;
    println!("Deleted {} log entries older than {} days", deleted, days);

    Ok(())
}
