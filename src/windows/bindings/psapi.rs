//! PSAPI.dll bindings for process memory counters

use crate::core::types::{MemoryError, MemoryResult};
use crate::windows::utils::ErrorCode;
use std::mem;
use winapi::shared::minwindef::{DWORD, FALSE};
use winapi::um::psapi::{GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS};
use winapi::um::winnt::HANDLE;

/// Commit charge and working set of a process, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCounters {
    pub private_usage: u64,
    pub working_set: u64,
}

/// Safe wrapper for GetProcessMemoryInfo
///
/// # Safety
/// The handle must be a valid process handle with query rights
pub unsafe fn get_process_memory_info(handle: HANDLE) -> MemoryResult<MemoryCounters> {
    let size = mem::size_of::<PROCESS_MEMORY_COUNTERS>() as DWORD;
    let mut counters: PROCESS_MEMORY_COUNTERS = mem::zeroed();
    counters.cb = size;

    let result = GetProcessMemoryInfo(handle, &mut counters, size);
    if result == FALSE {
        return Err(MemoryError::OsError {
            operation: "GetProcessMemoryInfo",
            code: ErrorCode::last_error().raw() as i32,
        });
    }

    Ok(MemoryCounters {
        private_usage: counters.PagefileUsage as u64,
        working_set: counters.WorkingSetSize as u64,
    })
}
