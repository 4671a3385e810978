use crate::Config;
use anyhow::Result;
use std::path::PathBuf;

pub async fn run(path: PathBuf, force: bool) -> Result<()> {
    std::fs::create_dir_all(&path)?;
    std::fs::create_dir_all(path.join("data"))?;

    let config_path = path.join("hookrelay.toml");
    if config_path.exists() && !force {
        anyhow::bail!(
            "'{}' already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    let config = toml::to_string_pretty(&Config::default())?;
    std::fs::write(&config_path, config)?;

    tracing::info!("Created {}", config_path.display());
    tracing::info!("Run 'hookrelay migrate' to set up the database");
    tracing::info!("Run 'hookrelay serve' to start the server");

    Ok(())
}
