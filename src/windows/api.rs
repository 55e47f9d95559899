//! Win32 implementation of [`ProcessApi`]

use super::bindings::{kernel32, psapi, toolhelp};
use super::types::Handle;
use crate::core::types::{
    Address, MemoryError, MemoryRegion, MemoryResult, ProcessEntry, ProcessId, ProcessStats,
    Protection,
};
use crate::process::ProcessApi;
use tracing::debug;
use winapi::um::winnt::{
    MEMORY_BASIC_INFORMATION, MEM_COMMIT, PAGE_EXECUTE, PAGE_EXECUTE_READ, PAGE_EXECUTE_READWRITE,
    PAGE_EXECUTE_WRITECOPY, PAGE_GUARD, PAGE_NOACCESS, PAGE_READONLY, PAGE_READWRITE,
    PAGE_WRITECOPY,
};

/// Maps a `VirtualQueryEx` record onto the portable region type
pub fn region_from_mbi(mbi: &MEMORY_BASIC_INFORMATION) -> MemoryRegion {
    MemoryRegion::new(
        Address::new(mbi.BaseAddress as u64),
        mbi.RegionSize as u64,
        protection_from_flags(mbi.State, mbi.Protect),
    )
}

/// Uncommitted, guard and no-access pages report no permissions
pub fn protection_from_flags(state: u32, protect: u32) -> Protection {
    if state != MEM_COMMIT || protect & PAGE_GUARD != 0 || protect & PAGE_NOACCESS != 0 {
        return Protection::NONE;
    }

    let base = protect & 0xFF;
    let read = matches!(
        base,
        PAGE_READONLY
            | PAGE_READWRITE
            | PAGE_WRITECOPY
            | PAGE_EXECUTE_READ
            | PAGE_EXECUTE_READWRITE
            | PAGE_EXECUTE_WRITECOPY
    );
    let write = matches!(
        base,
        PAGE_READWRITE | PAGE_WRITECOPY | PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY
    );
    let execute = matches!(
        base,
        PAGE_EXECUTE | PAGE_EXECUTE_READ | PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY
    );

    Protection::new(read, write, execute)
}

/// Windows process backend built on kernel32, psapi and toolhelp
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32ProcessApi;

impl Win32ProcessApi {
    pub fn new() -> Self {
        Win32ProcessApi
    }
}

impl ProcessApi for Win32ProcessApi {
    type Handle = Handle;

    fn list_processes(&self) -> MemoryResult<Vec<ProcessEntry>> {
        let mut processes: Vec<ProcessEntry> = toolhelp::process_snapshot()?
            .into_iter()
            .filter(|entry| entry.pid != 0)
            .map(|entry| ProcessEntry::new(entry.pid, entry.exe_name))
            .collect();

        processes.sort_by_key(|p| p.pid);
        Ok(processes)
    }

    fn open(&self, pid: ProcessId) -> MemoryResult<Handle> {
        if pid == 0 {
            return Err(MemoryError::ProcessNotFound(format!("PID: {}", pid)));
        }

        let raw = kernel32::open_process(pid, kernel32::SCANNER_ACCESS)?;
        Ok(Handle::new(raw, pid))
    }

    fn close(&self, handle: Handle) {
        debug!(pid = handle.pid(), "Closing process handle");
        drop(handle);
    }

    fn query_region(&self, handle: &Handle, address: Address) -> MemoryResult<Option<MemoryRegion>> {
        let mbi = unsafe { kernel32::virtual_query_ex(handle.raw(), address)? };
        Ok(mbi.as_ref().map(region_from_mbi))
    }

    fn read(&self, handle: &Handle, address: Address, buffer: &mut [u8]) -> MemoryResult<()> {
        unsafe { kernel32::read_process_memory(handle.raw(), address, buffer) }
    }

    fn write(&self, handle: &Handle, address: Address, data: &[u8]) -> MemoryResult<()> {
        unsafe { kernel32::write_process_memory(handle.raw(), address, data) }
    }

    fn process_stats(&self, handle: &Handle) -> MemoryResult<ProcessStats> {
        let counters = unsafe { psapi::get_process_memory_info(handle.raw())? };
        let thread_count = toolhelp::thread_count(handle.pid())?.unwrap_or(0);

        Ok(ProcessStats {
            pid: handle.pid(),
            virtual_size: counters.private_usage,
            resident_size: counters.working_set,
            thread_count,
        })
    }

    fn is_alive(&self, handle: &Handle) -> bool {
        unsafe { kernel32::is_process_running(handle.raw()) }
    }
}
