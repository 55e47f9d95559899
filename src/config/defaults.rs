//! Default configuration values for memprobe

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub scanner: ScannerDefaults,
    pub protocol: ProtocolDefaults,
    pub logging: LoggingDefaults,
}

/// Default scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub float_tolerance: f64,
    pub parallel_threshold: usize,
    pub max_threads: usize,
    pub max_region_size: u64,
}

/// Default command protocol configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolDefaults {
    pub strict_addresses: bool,
    pub default_end_address: String,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        scanner: ScannerDefaults {
            float_tolerance: 10.0,
            parallel_threshold: 1048576, // 1MB
            max_threads: num_cpus::get().min(8),
            max_region_size: 1073741824, // 1GB
        },
        protocol: ProtocolDefaults {
            strict_addresses: false,
            // Top of the canonical user-space half on 64-bit targets
            default_end_address: "7FFFFFFFFFFF".to_string(),
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
        },
    }
}
