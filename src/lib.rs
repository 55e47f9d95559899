//! memprobe: attach to a running process, search its memory for typed
//! values, refine the matches and patch them in place.

pub mod commands;
pub mod config;
pub mod core;
pub mod memory;
pub mod process;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(windows)]
pub mod windows;

// Re-export main types from core module
pub use core::types::{
    Address, MemoryError, MemoryRegion, MemoryResult, NumericType, ProcessEntry, ProcessId,
    ProcessStats, Protection, SearchQuery, SearchResult, TypedValue, ValueRange,
};

pub use commands::{Command, CommandFacade, CommandOutput, CommandService};
pub use memory::{ScanEngine, ScanOptions};
pub use process::{ProcessApi, ProcessSession};
