//! Custom error types for memprobe

use super::{Address, NumericType, ProcessId};
use thiserror::Error;

/// Main error type for attach, scan and patch operations
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Attach denied for process {pid}: {reason}")]
    AttachDenied { pid: ProcessId, reason: String },

    #[error("No process attached")]
    NotAttached,

    #[error("Invalid value type: {0}")]
    InvalidType(String),

    #[error("Invalid {value_type} value: {text:?}")]
    InvalidValueFormat {
        text: String,
        value_type: NumericType,
    },

    #[error("Invalid range format: {0:?}")]
    InvalidRangeFormat(String),

    #[error("Invalid buffer size: expected {expected}, got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },

    #[error("Invalid memory address: {0:?}")]
    InvalidAddress(String),

    #[error("Memory unreadable at {address}: {reason}")]
    MemoryUnreadable { address: Address, reason: String },

    #[error("Failed to write memory at {address}: {reason}")]
    WriteFailed { address: Address, reason: String },

    #[error("No previous search results")]
    NoPriorResults,

    #[error("{operation} failed with OS error {code}")]
    OsError { operation: &'static str, code: i32 },

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

impl MemoryError {
    /// Creates an attach denied error for a process
    pub fn attach_denied(pid: ProcessId, reason: impl Into<String>) -> Self {
        MemoryError::AttachDenied {
            pid,
            reason: reason.into(),
        }
    }

    /// Creates a read failure error
    pub fn read_failed(address: Address, reason: impl Into<String>) -> Self {
        MemoryError::MemoryUnreadable {
            address,
            reason: reason.into(),
        }
    }

    /// Creates a write failure error
    pub fn write_failed(address: Address, reason: impl Into<String>) -> Self {
        MemoryError::WriteFailed {
            address,
            reason: reason.into(),
        }
    }

    /// Creates a value format error
    pub fn invalid_value(text: impl Into<String>, value_type: NumericType) -> Self {
        MemoryError::InvalidValueFormat {
            text: text.into(),
            value_type,
        }
    }

    /// Whether a scan may skip past this error and keep going
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MemoryError::MemoryUnreadable { .. } | MemoryError::WriteFailed { .. }
        )
    }
}
