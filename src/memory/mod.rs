//! Memory operations: typed reads and writes, searching and refinement
//!
//! This module provides:
//! - The [`ScanEngine`] with exact, range and nearby search
//! - The [`ResultSet`] it owns
//! - Typed read and write helpers over a [`ProcessSession`](crate::process::ProcessSession)

pub mod reader;
pub mod results;
pub mod scanner;
pub mod writer;

pub use reader::read_value;
pub use results::ResultSet;
pub use scanner::{par_scan_windows, scan_windows, ScanEngine, ScanOptions};
pub use writer::{write_all, write_value};
