use clap::Parser;
use hookrelay::cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hookrelay=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { path, force }) => {
            hookrelay::cli::init::run(path, force).await?;
        }
        Some(Commands::Serve { host, port }) => {
            hookrelay::cli::serve::run(&cli.config, host, port).await?;
        }
        Some(Commands::Migrate) => {
            hookrelay::cli::migrate::run(&cli.config).await?;
        }
        Some(Commands::Endpoint { command }) => {
            hookrelay::cli::endpoint::run(&cli.config, command).await?;
        }
        Some(Commands::Destination { command }) => {
            hookrelay::cli::endpoint::run_destination(&cli.config, command).await?;
        }
        Some(Commands::Prune { days }) => {
            hookrelay::cli::prune::run(&cli.config, days).await?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
        }
    }

    Ok(())
}
