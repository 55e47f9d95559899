//! Core module containing fundamental types for memprobe
//!
//! This module provides the foundational building blocks used throughout
//! the engine: addresses, typed values, search results, process information
//! and error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Address, MemoryError, MemoryRegion, MemoryResult, NumericType, ProcessId, SearchResult,
    TypedValue,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

#[cfg(not(target_pointer_width = "64"))]
compile_error!("memprobe requires 64-bit architecture");
