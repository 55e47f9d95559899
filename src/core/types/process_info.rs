//! Process and memory region information types

use super::{Address, ProcessId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A running process as reported by the OS process list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: ProcessId,
    pub name: String,
}

impl ProcessEntry {
    pub fn new(pid: ProcessId, name: impl Into<String>) -> Self {
        ProcessEntry {
            pid,
            name: name.into(),
        }
    }

    /// Case-insensitive substring match on the process name
    pub fn name_contains(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Resource usage of the attached target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStats {
    pub pid: ProcessId,
    pub virtual_size: u64,
    pub resident_size: u64,
    pub thread_count: u32,
}

const MIB: f64 = 1024.0 * 1024.0;

impl fmt::Display for ProcessStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PID: {}", self.pid)?;
        writeln!(f, "Virtual Size: {:.2} MB", self.virtual_size as f64 / MIB)?;
        writeln!(f, "Resident Size: {:.2} MB", self.resident_size as f64 / MIB)?;
        write!(f, "Threads: {}", self.thread_count)
    }
}

/// Read/write/execute permission triple of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Protection {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Protection {
    pub const NONE: Protection = Protection::new(false, false, false);
    pub const READ: Protection = Protection::new(true, false, false);
    pub const READ_WRITE: Protection = Protection::new(true, true, false);
    pub const READ_EXECUTE: Protection = Protection::new(true, false, true);

    pub const fn new(read: bool, write: bool, execute: bool) -> Self {
        Protection {
            read,
            write,
            execute,
        }
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' },
        )
    }
}

/// A contiguous span of the target's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub address: Address,
    pub size: u64,
    pub protection: Protection,
}

impl MemoryRegion {
    pub fn new(address: Address, size: u64, protection: Protection) -> Self {
        MemoryRegion {
            address,
            size,
            protection,
        }
    }

    pub fn is_readable(&self) -> bool {
        self.protection.read
    }

    pub fn is_writable(&self) -> bool {
        self.protection.write
    }

    pub fn is_executable(&self) -> bool {
        self.protection.execute
    }

    /// First address past the region (saturating at the top of the space)
    pub fn end_address(&self) -> Address {
        Address::new(self.address.as_u64().saturating_add(self.size))
    }

    /// Checks if an address is within this region
    pub fn contains(&self, address: Address) -> bool {
        address >= self.address && address < self.end_address()
    }
}
