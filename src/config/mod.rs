//! # Configuration Management Module
//!
//! Centralized configuration for the Townstead server: type-safe structures
//! with serde, sensible defaults, and TOML persistence.
//!
//! ## Configuration Structure
//!
//! - [`StorageConfig`] - Flat-file database location
//! - [`EconomyConfig`] - Transfer protocol settings (closed economy, server account)
//! - [`LoggingConfig`] - Logging settings
//!
//! ## Configuration File Format
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//!
//! [economy]
//! closed_economy = false
//! server_account = "townstead-server"
//! server_world = "world"
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the flat-file database tree.
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Route all payments and collections through the server account instead
    /// of treating the outside world as an infinite sink/faucet.
    #[serde(default)]
    pub closed_economy: bool,
    /// Ledger-side name of the server account.
    #[serde(default = "default_server_account")]
    pub server_account: String,
    /// World the server account's balance lives in; also the fallback world
    /// for accounts with no world of their own.
    #[serde(default = "default_server_world")]
    pub server_world: String,
    /// Money log file, relative paths resolve against the working directory.
    #[serde(default = "default_money_log")]
    pub money_log: String,
}

fn default_server_account() -> String {
    "townstead-server".to_string()
}

fn default_server_world() -> String {
    "world".to_string()
}

fn default_money_log() -> String {
    "money.log".to_string()
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            closed_economy: false,
            server_account: default_server_account(),
            server_world: default_server_world(),
            money_log: default_money_log(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.economy.server_account.trim().is_empty() {
            return Err(anyhow!("economy.server_account must not be empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                data_dir: "./data".to_string(),
            },
            economy: EconomyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
