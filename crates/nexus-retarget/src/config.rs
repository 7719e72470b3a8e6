//! Tool configuration.

use crate::Args;
use anyhow::{Context, Result};
use nexus_consensus::{RetargetParams, RetargetParamsConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetargetConfig {
    /// Network preset (mainnet, testnet).
    pub network: String,
    /// Full parameter set replacing the network preset.
    #[serde(default)]
    pub params: Option<RetargetParamsConfig>,
}

impl RetargetConfig {
    /// Load configuration from file, falling back to the network preset.
    pub fn load(config_path: &Path, args: &Args) -> Result<Self> {
        let mut config = if config_path.exists() {
            let content =
                std::fs::read_to_string(config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Self::default_for_network(args.network.as_deref().unwrap_or("mainnet"))
        };

        // Only override if explicitly provided via CLI
        if let Some(ref network) = args.network {
            config.network = network.clone();
        }

        Ok(config)
    }

    /// Configuration using the preset of `network`.
    pub fn default_for_network(network: &str) -> Self {
        Self {
            network: network.to_string(),
            params: None,
        }
    }

    /// Resolve the retarget constants.
    pub fn params(&self) -> Result<RetargetParams> {
        match &self.params {
            Some(params) => RetargetParams::from_config(params)
                .with_context(|| format!("Invalid [params] for network {}", self.network)),
            None => RetargetParams::for_network(&self.network)
                .with_context(|| format!("Unknown network: {}", self.network)),
        }
    }
}
