use crate::services::delivery_log;
use crate::{web, Config, Database};
use anyhow::Result;
use std::path::Path;
use std::time::Duration;

pub async fn run(config_path: &Path, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path, config.database.pool_size)?;

    db.migrate()?;

    let retention_days = config.logs.retention_days;
    if retention_days > 0 {
        let retention_db = db.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(3600));
            loop {
                interval.tick().await;
                if let Err(e) = delivery_log::prune_events(&retention_db, retention_days) {
                    tracing::error!("Delivery log retention job failed: {}", e);
                }
            }
        });
    }

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting hookrelay at http://{}", addr);

    web::serve(config, db, &addr).await?;

    Ok(())
}
