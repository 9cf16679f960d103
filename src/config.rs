//! Configuration management for the TrinityChain console

use crate::error::{ConsoleError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub fees: FeeConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_url")]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// Key-store file opened at startup. Falls back to `~/.trinity/wallet.json`.
    pub path: Option<PathBuf>,
}

impl WalletConfig {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".trinity").join("wallet.json")))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_magic")]
    pub magic: u32,
    #[serde(default = "default_valid_until_increment")]
    pub max_valid_until_block_increment: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            magic: default_magic(),
            max_valid_until_block_increment: default_valid_until_increment(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeeConfig {
    /// Used only when the Policy contract cannot be queried.
    #[serde(default = "default_fee_per_byte")]
    pub default_fee_per_byte: i64,
    /// Network fee charged per signature verification.
    #[serde(default = "default_signature_fee")]
    pub signature_fee: i64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            default_fee_per_byte: default_fee_per_byte(),
            signature_fee: default_signature_fee(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_color")]
    pub color: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            color: default_color(),
            log_level: default_log_level(),
        }
    }
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:10332".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_magic() -> u32 {
    0x5452_4E59
}

fn default_valid_until_increment() -> u32 {
    5760
}

fn default_fee_per_byte() -> i64 {
    1000
}

fn default_signature_fee() -> i64 {
    1_000_000
}

fn default_color() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Load configuration from `path`, or from `config.toml` in the working
/// directory. A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let config_str = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    let config: Config = if config_str.trim().is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)?
    };

    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.rpc.url.trim().is_empty() {
            return Err(ConsoleError::ConfigError("rpc.url must be set".to_string()));
        }
        if self.network.max_valid_until_block_increment == 0 {
            return Err(ConsoleError::ConfigError(
                "network.max_valid_until_block_increment must be greater than zero".to_string(),
            ));
        }
        if self.fees.default_fee_per_byte < 0 || self.fees.signature_fee < 0 {
            return Err(ConsoleError::ConfigError("fees must not be negative".to_string()));
        }
        Ok(())
    }
}
