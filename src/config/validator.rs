//! Configuration validator for memprobe
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, ProtocolConfig, ScannerConfig};

/// Accepted `logging.level` values
pub const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_scanner(&config.scanner)?;
        Self::validate_protocol(&config.protocol)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    /// Validates scanner configuration
    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        if !scanner.float_tolerance.is_finite() || scanner.float_tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "Float tolerance must be a finite non-negative number, got {}",
                scanner.float_tolerance
            )));
        }

        if scanner.parallel_threshold == 0 {
            return Err(ConfigError::Invalid(
                "Parallel threshold must be greater than 0".to_string(),
            ));
        }

        // Validate thread count
        if scanner.max_threads == 0 {
            return Err(ConfigError::Invalid(
                "Scanner threads must be at least 1".to_string(),
            ));
        }

        if scanner.max_threads > 128 {
            return Err(ConfigError::Invalid(
                "Scanner threads cannot exceed 128".to_string(),
            ));
        }

        if scanner.max_region_size == 0 {
            return Err(ConfigError::Invalid(
                "Maximum region size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_protocol(protocol: &ProtocolConfig) -> Result<(), ConfigError> {
        protocol.end_address().map(|_| ())
    }

    /// Validates logging configuration
    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, LOG_LEVELS
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}
