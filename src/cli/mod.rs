pub mod endpoint;
pub mod init;
pub mod migrate;
pub mod prune;
pub mod serve;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hookrelay")]
#[command(version)]
#[command(about = "Receive webhooks and fan them out to many destinations", long_about = None)]
pub struct Cli {
    #[arg(short, long, default_value = "hookrelay.toml", env = "HOOKRELAY_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        force: bool,
    },
    /// Run the HTTP server
    Serve {
        #[arg(short = 'H', long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations
    Migrate,
    /// Manage endpoints
    Endpoint {
        #[command(subcommand)]
        command: EndpointCommand,
    },
    /// Manage destinations
    Destination {
        #[command(subcommand)]
        command: DestinationCommand,
    },
    /// Delete delivery log entries older than the retention window
    Prune {
        /// Overrides logs.retention_days
        #[arg(long)]
        days: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum EndpointCommand {
    Add {
        #[arg(long)]
        name: String,
        /// Derived from the name when omitted
        #[arg(long)]
        slug: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    List,
    Enable {
        slug: String,
    },
    Disable {
        slug: String,
    },
    Remove {
        slug: String,
    },
}

#[derive(Subcommand)]
pub enum DestinationCommand {
    Add {
        /// Slug of the owning endpoint
        #[arg(long)]
        endpoint: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "0")]
        order: i64,
        #[arg(long, default_value = "5000")]
        timeout_ms: i64,
        #[arg(long, default_value = "0")]
        max_retries: i64,
    },
    List {
        endpoint: String,
    },
    Enable {
        id: i64,
    },
    Disable {
        id: i64,
    },
}
