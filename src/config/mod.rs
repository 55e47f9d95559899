//! Configuration module for memprobe
//!
//! Provides configuration loading, validation, and default settings
//! for the scanner and its command server.

mod defaults;
mod loader;
mod validator;

pub use defaults::{default_config, ConfigDefaults};
pub use loader::{load_config, ConfigLoader, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE};
pub use validator::{validate_config, ConfigValidator, LOG_LEVELS};

// Re-export the configuration structures
pub use loader::{Config, LoggingConfig, ProtocolConfig, ScannerConfig};

// Configuration-related error type
pub use loader::ConfigError;

// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;
