pub mod aggregator;
pub mod delivery_log;
pub mod dispatcher;
pub mod ingest;
pub mod registry;
pub mod resolver;
pub mod slug;
pub mod stats;
