//! Memory address wrapper type with hex parsing

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents an address in the target process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub u64);

impl Address {
    /// Creates a new address from a u64 value
    pub const fn new(value: u64) -> Self {
        Address(value)
    }

    /// Creates a null address (0x0)
    pub const fn null() -> Self {
        Address(0)
    }

    /// Checks if the address is null
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns the raw u64 value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Adds an unsigned byte offset, `None` on overflow
    pub fn checked_add(&self, bytes: u64) -> Option<Self> {
        self.0.checked_add(bytes).map(Address)
    }

    /// Applies a signed delta, `None` if the result leaves the address space
    pub fn checked_offset(&self, delta: i64) -> Option<Self> {
        self.0.checked_add_signed(delta).map(Address)
    }

    /// Parses a hex address the way the legacy protocol does: any malformed
    /// or empty input becomes address 0.
    pub fn parse_lenient(text: &str) -> Self {
        text.parse().unwrap_or(Address::null())
    }
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

impl FromStr for Address {
    type Err = MemoryError;

    /// Hexadecimal with an optional `0x` prefix, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = strip_hex_prefix(s.trim());
        if digits.is_empty() || digits.starts_with('+') {
            return Err(MemoryError::InvalidAddress(s.to_string()));
        }

        u64::from_str_radix(digits, 16)
            .map(Address::new)
            .map_err(|_| MemoryError::InvalidAddress(s.to_string()))
    }
}

/// Parses a signed hexadecimal delta such as `"0x10"`, `"-0x8"` or `"ff"`
pub fn parse_offset(text: &str) -> MemoryResult<i64> {
    let trimmed = text.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let digits = strip_hex_prefix(rest);
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(MemoryError::InvalidAddress(text.to_string()));
    }

    let magnitude = u64::from_str_radix(digits, 16)
        .map_err(|_| MemoryError::InvalidAddress(text.to_string()))?;

    let value = if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    };
    value.ok_or_else(|| MemoryError::InvalidAddress(text.to_string()))
}

impl fmt::Display for Address {
    /// `0x` followed by uppercase hex, no padding
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address::new(value)
    }
}

impl From<usize> for Address {
    fn from(value: usize) -> Self {
        Address::new(value as u64)
    }
}
