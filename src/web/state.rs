use crate::services::dispatcher::Dispatcher;
use crate::{Config, Database};
use anyhow::Result;

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let dispatcher = Dispatcher::new(config.dispatch.clone())?;

        Ok(Self {
            config,
            db,
            dispatcher,
        })
    }
}
