//! Configuration loader for memprobe
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use super::validator::validate_config;
use crate::core::types::Address;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "memprobe.toml";

/// Environment variable overriding the configuration file path
pub const CONFIG_ENV_VAR: &str = "MEMPROBE_CONFIG";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_scanner")]
    pub scanner: ScannerConfig,

    #[serde(default = "default_protocol")]
    pub protocol: ProtocolConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

/// Scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Multiplier of machine epsilon used for float equality
    #[serde(default = "default_float_tolerance")]
    pub float_tolerance: f64,
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
    #[serde(default = "default_max_region_size")]
    pub max_region_size: u64,
}

/// Command protocol configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Reject malformed addresses instead of treating them as 0
    #[serde(default = "default_strict_addresses")]
    pub strict_addresses: bool,
    /// Upper bound used when a search omits `endAddr`
    #[serde(default = "default_end_address")]
    pub default_end_address: String,
}

impl ProtocolConfig {
    /// Parsed form of `default_end_address`
    pub fn end_address(&self) -> Result<Address, ConfigError> {
        self.default_end_address.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "default_end_address is not a hex address: {:?}",
                self.default_end_address
            ))
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Loader for `$MEMPROBE_CONFIG`, or `memprobe.toml` when unset
    pub fn from_env() -> Self {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => ConfigLoader::new(path),
            None => ConfigLoader::new(DEFAULT_CONFIG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults only when the file is
    /// missing
    pub fn load_or_default(&self) -> Result<Config, ConfigError> {
        match self.load() {
            Err(ConfigError::FileNotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }
}

/// Loads and validates configuration from the default location
pub fn load_config() -> Result<Config, ConfigError> {
    let config = ConfigLoader::from_env().load_or_default()?;
    validate_config(&config)?;
    Ok(config)
}

// Default functions for serde
fn default_scanner() -> ScannerConfig {
    let defaults = default_config();
    ScannerConfig {
        float_tolerance: defaults.scanner.float_tolerance,
        parallel_threshold: defaults.scanner.parallel_threshold,
        max_threads: defaults.scanner.max_threads,
        max_region_size: defaults.scanner.max_region_size,
    }
}

fn default_protocol() -> ProtocolConfig {
    let defaults = default_config();
    ProtocolConfig {
        strict_addresses: defaults.protocol.strict_addresses,
        default_end_address: defaults.protocol.default_end_address,
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_config().logging.level,
    }
}

// Individual field defaults
fn default_float_tolerance() -> f64 {
    default_config().scanner.float_tolerance
}

fn default_parallel_threshold() -> usize {
    default_config().scanner.parallel_threshold
}

fn default_max_threads() -> usize {
    default_config().scanner.max_threads
}

fn default_max_region_size() -> u64 {
    default_config().scanner.max_region_size
}

fn default_strict_addresses() -> bool {
    default_config().protocol.strict_addresses
}

fn default_end_address() -> String {
    default_config().protocol.default_end_address
}

fn default_log_level() -> String {
    default_config().logging.level
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scanner: default_scanner(),
            protocol: default_protocol(),
            logging: default_logging(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        default_scanner()
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        default_protocol()
    }
}
