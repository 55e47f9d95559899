//! Windows error code handling utilities

use crate::core::types::{MemoryError, ProcessId};
use std::fmt;
use winapi::um::errhandlingapi::GetLastError;

/// Common Windows error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success,
    AccessDenied,
    InvalidHandle,
    InvalidParameter,
    PartialCopy,
    NoAccess,
    Unknown(u32),
}

impl From<u32> for ErrorCode {
    fn from(code: u32) -> Self {
        match code {
            0 => ErrorCode::Success,
            5 => ErrorCode::AccessDenied,
            6 => ErrorCode::InvalidHandle,
            87 => ErrorCode::InvalidParameter,
            299 => ErrorCode::PartialCopy,
            998 => ErrorCode::NoAccess,
            _ => ErrorCode::Unknown(code),
        }
    }
}

impl ErrorCode {
    /// Get the last Windows error
    pub fn last_error() -> Self {
        unsafe { ErrorCode::from(GetLastError()) }
    }

    /// The raw Win32 error number
    pub fn raw(&self) -> u32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::AccessDenied => 5,
            ErrorCode::InvalidHandle => 6,
            ErrorCode::InvalidParameter => 87,
            ErrorCode::PartialCopy => 299,
            ErrorCode::NoAccess => 998,
            ErrorCode::Unknown(code) => *code,
        }
    }

    /// Maps an `OpenProcess` failure to the attach taxonomy
    pub fn to_attach_error(self, pid: ProcessId) -> MemoryError {
        match self {
            // OpenProcess reports a non-existent pid as an invalid parameter
            ErrorCode::InvalidParameter => MemoryError::ProcessNotFound(format!("PID: {}", pid)),
            other => MemoryError::attach_denied(pid, other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Success => write!(f, "Success"),
            ErrorCode::AccessDenied => write!(f, "Access denied (os error 5)"),
            ErrorCode::InvalidHandle => write!(f, "Invalid handle (os error 6)"),
            ErrorCode::InvalidParameter => write!(f, "Invalid parameter (os error 87)"),
            ErrorCode::PartialCopy => write!(f, "Partial copy (os error 299)"),
            ErrorCode::NoAccess => write!(f, "Invalid access to memory location (os error 998)"),
            ErrorCode::Unknown(code) => write!(f, "Unknown error (os error {})", code),
        }
    }
}
