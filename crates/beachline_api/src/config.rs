use std::path::{Path, PathBuf};

use beachline_core::store::MemoryStore;
use beachline_core::{CoreError, SeedData};
use chrono::{DateTime, Utc};
use clap::Parser;
use thiserror::Error;

/// Command line arguments for the beachline server
#[derive(Parser, Debug, Clone)]
#[command(name = "beachline")]
#[command(about = "Occupancy, weather and calendar dashboard backend for coastal stations")]
pub struct ServerConfig {
    /// Path to the JSON seed file with stations and initial readings
    #[arg(short, long, env = "BEACHLINE_SEED", default_value = "data/seed.json")]
    pub seed: PathBuf,

    /// Address to bind the server to
    #[arg(long, env = "BEACHLINE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the server to
    #[arg(short, long, env = "BEACHLINE_PORT", default_value = "3000")]
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read seed file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse seed file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid seed data: {0}")]
    Seed(#[from] CoreError),
}

pub fn parse_seed(path: &Path, content: &str) -> Result<SeedData, ConfigError> {
    serde_json::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub async fn load_seed(path: &Path) -> Result<SeedData, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_seed(path, &content)
}

/// Read the seed file and build the store it describes.
pub async fn load_store(path: &Path, now: DateTime<Utc>) -> Result<MemoryStore, ConfigError> {
    let seed = load_seed(path).await?;
    Ok(seed.into_store(now)?)
}
