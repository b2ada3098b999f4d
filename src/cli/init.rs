//! Init command implementation

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use vox::config::Config;

pub fn init_command(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    // Default to global config path
    let config_path = config_path.unwrap_or_else(Config::global_config_path);

    Config::write_default(&config_path, force)?;
    info!("Wrote default configuration");
    println!("Created: {}", config_path.display());

    Ok(())
}
