//! Core type definitions for memprobe
//!
//! This module contains the plain data types shared by every layer:
//! addresses, typed values and their codec, ranges and queries, search
//! results, process/region descriptions and the error taxonomy.

mod address;
mod error;
mod process_info;
mod range;
mod scan_result;
mod value;

// Re-export all public types
pub use address::{parse_offset, Address};
pub use error::{MemoryError, MemoryResult};
pub use process_info::{MemoryRegion, ProcessEntry, ProcessStats, Protection};
pub use range::{SearchQuery, ValueRange, RANGE_SEPARATOR};
pub use scan_result::{ResultEntry, SearchResult};
pub use value::{FloatTolerance, NumericType, TypedValue};

// Common type aliases
pub type ProcessId = u32;
