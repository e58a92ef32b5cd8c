use std::path::Path;

use miner::MinerConfig;
use networking::sync::SyncConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Node configuration. Every field falls back to the protocol defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub sync: SyncConfig,
    pub miner: MinerConfig,
}

impl NodeConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: NodeConfig = serde_yaml::from_reader(file)?;
        info!(path = ?path.as_ref(), "Node config loaded");
        Ok(config)
    }
}
