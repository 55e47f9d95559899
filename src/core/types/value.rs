//! Typed numeric values and their text/byte codec

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Numeric types that can be searched for and written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericType {
    I32,
    I64,
    F32,
    F64,
}

impl NumericType {
    /// All supported types, in protocol order
    pub const ALL: [NumericType; 4] = [
        NumericType::I32,
        NumericType::I64,
        NumericType::F32,
        NumericType::F64,
    ];

    /// Returns the encoded width in bytes
    pub const fn width(&self) -> usize {
        match self {
            NumericType::I32 | NumericType::F32 => 4,
            NumericType::I64 | NumericType::F64 => 8,
        }
    }

    /// Returns the protocol tag (`"I32"`, `"I64"`, `"F32"`, `"F64"`)
    pub const fn as_str(&self) -> &'static str {
        match self {
            NumericType::I32 => "I32",
            NumericType::I64 => "I64",
            NumericType::F32 => "F32",
            NumericType::F64 => "F64",
        }
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, NumericType::F32 | NumericType::F64)
    }
}

impl FromStr for NumericType {
    type Err = MemoryError;

    /// Protocol tags are case-sensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "I32" => Ok(NumericType::I32),
            "I64" => Ok(NumericType::I64),
            "F32" => Ok(NumericType::F32),
            "F64" => Ok(NumericType::F64),
            other => Err(MemoryError::InvalidType(other.to_string())),
        }
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tolerance used for point equality of floating point values.
///
/// Two floats are equal when their difference is strictly below
/// `epsilon_multiplier * EPSILON` of their width. Integers always compare
/// exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatTolerance {
    pub epsilon_multiplier: f64,
}

impl FloatTolerance {
    pub const fn new(epsilon_multiplier: f64) -> Self {
        FloatTolerance { epsilon_multiplier }
    }

    /// Bit-exact float comparison
    pub const fn exact() -> Self {
        FloatTolerance::new(0.0)
    }

    fn f32_equal(&self, a: f32, b: f32) -> bool {
        a == b || (a - b).abs() < f32::EPSILON * self.epsilon_multiplier as f32
    }

    fn f64_equal(&self, a: f64, b: f64) -> bool {
        a == b || (a - b).abs() < f64::EPSILON * self.epsilon_multiplier
    }
}

impl Default for FloatTolerance {
    fn default() -> Self {
        FloatTolerance::new(10.0)
    }
}

/// A single concrete value of one of the supported numeric types
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum TypedValue {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl TypedValue {
    /// Parses `text` as a literal of `value_type`. Surrounding whitespace is
    /// rejected.
    pub fn parse(text: &str, value_type: NumericType) -> MemoryResult<Self> {
        let invalid = || MemoryError::invalid_value(text, value_type);

        match value_type {
            NumericType::I32 => text.parse().map(TypedValue::I32).map_err(|_| invalid()),
            NumericType::I64 => text.parse().map(TypedValue::I64).map_err(|_| invalid()),
            NumericType::F32 => {
                let value: f32 = text.parse().map_err(|_| invalid())?;
                if value.is_infinite() && !names_infinity(text) {
                    return Err(invalid());
                }
                Ok(TypedValue::F32(value))
            }
            NumericType::F64 => {
                let value: f64 = text.parse().map_err(|_| invalid())?;
                if value.is_infinite() && !names_infinity(text) {
                    return Err(invalid());
                }
                Ok(TypedValue::F64(value))
            }
        }
    }

    /// Reinterprets exactly `value_type.width()` little-endian bytes
    pub fn decode(bytes: &[u8], value_type: NumericType) -> MemoryResult<Self> {
        let size_error = || MemoryError::InvalidBufferSize {
            expected: value_type.width(),
            actual: bytes.len(),
        };

        Ok(match value_type {
            NumericType::I32 => {
                TypedValue::I32(i32::from_le_bytes(bytes.try_into().map_err(|_| size_error())?))
            }
            NumericType::I64 => {
                TypedValue::I64(i64::from_le_bytes(bytes.try_into().map_err(|_| size_error())?))
            }
            NumericType::F32 => {
                TypedValue::F32(f32::from_le_bytes(bytes.try_into().map_err(|_| size_error())?))
            }
            NumericType::F64 => {
                TypedValue::F64(f64::from_le_bytes(bytes.try_into().map_err(|_| size_error())?))
            }
        })
    }

    /// Encodes the value into its fixed-width little-endian form
    pub fn encode(&self) -> Vec<u8> {
        match self {
            TypedValue::I32(v) => v.to_le_bytes().to_vec(),
            TypedValue::I64(v) => v.to_le_bytes().to_vec(),
            TypedValue::F32(v) => v.to_le_bytes().to_vec(),
            TypedValue::F64(v) => v.to_le_bytes().to_vec(),
        }
    }

    /// Gets the numeric type tag for this value
    pub fn numeric_type(&self) -> NumericType {
        match self {
            TypedValue::I32(_) => NumericType::I32,
            TypedValue::I64(_) => NumericType::I64,
            TypedValue::F32(_) => NumericType::F32,
            TypedValue::F64(_) => NumericType::F64,
        }
    }

    /// Point equality; values of different types never compare equal
    pub fn approx_eq(&self, other: &TypedValue, tolerance: FloatTolerance) -> bool {
        match (self, other) {
            (TypedValue::I32(a), TypedValue::I32(b)) => a == b,
            (TypedValue::I64(a), TypedValue::I64(b)) => a == b,
            (TypedValue::F32(a), TypedValue::F32(b)) => tolerance.f32_equal(*a, *b),
            (TypedValue::F64(a), TypedValue::F64(b)) => tolerance.f64_equal(*a, *b),
            _ => false,
        }
    }

    /// Ordering between two values of the same type.
    ///
    /// Returns `None` for mismatched types and for NaN.
    pub fn compare(&self, other: &TypedValue) -> Option<Ordering> {
        match (self, other) {
            (TypedValue::I32(a), TypedValue::I32(b)) => Some(a.cmp(b)),
            (TypedValue::I64(a), TypedValue::I64(b)) => Some(a.cmp(b)),
            (TypedValue::F32(a), TypedValue::F32(b)) => a.partial_cmp(b),
            (TypedValue::F64(a), TypedValue::F64(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

fn names_infinity(text: &str) -> bool {
    text.to_ascii_lowercase().contains("inf")
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::I32(v) => write!(f, "{}", v),
            TypedValue::I64(v) => write!(f, "{}", v),
            // Debug keeps the decimal point on whole floats ("1.0", not "1")
            TypedValue::F32(v) => write!(f, "{:?}", v),
            TypedValue::F64(v) => write!(f, "{:?}", v),
        }
    }
}
