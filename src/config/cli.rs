use crate::config::toml_config::ReplenishConfig;
use crate::core::Storage;
use crate::utils::error::Result;
use clap::Parser;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Parser)]
#[command(name = "auto-replenish")]
#[command(about = "Covers forecast shortages by internal transfer, then external purchase")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "replenish.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the resolved plan without calling any service
    #[arg(long)]
    pub dry_run: bool,

    /// Override run.material
    #[arg(long)]
    pub material: Option<String>,

    /// Override run.home_location
    #[arg(long)]
    pub location: Option<String>,

    /// Override run.peer_locations (comma separated, evaluated in this order)
    #[arg(long, value_delimiter = ',')]
    pub peers: Option<Vec<String>>,

    /// Override run.horizon_weeks
    #[arg(long)]
    pub horizon_weeks: Option<u32>,
}

impl CliArgs {
    /// Command-line values win over the file.
    pub fn apply_overrides(&self, config: &mut ReplenishConfig) {
        if let Some(material) = &self.material {
            config.run.material = material.clone();
        }
        if let Some(location) = &self.location {
            config.run.home_location = location.clone();
        }
        if let Some(peers) = &self.peers {
            config.run.peer_locations = peers.clone();
        }
        if let Some(weeks) = self.horizon_weeks {
            config.run.horizon_weeks = weeks;
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}
