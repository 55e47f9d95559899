//! Toolhelp32 snapshot bindings for process enumeration

use crate::core::types::{MemoryError, MemoryResult, ProcessId};
use crate::windows::utils::ErrorCode;
use std::ffi::OsString;
use std::mem;
use std::os::windows::ffi::OsStringExt;
use winapi::shared::minwindef::{DWORD, FALSE};
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};

/// One row of a process snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub pid: ProcessId,
    pub exe_name: String,
    pub thread_count: u32,
}

/// Walks a fresh process snapshot
pub fn process_snapshot() -> MemoryResult<Vec<SnapshotEntry>> {
    unsafe {
        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0);
        if snapshot == INVALID_HANDLE_VALUE {
            return Err(MemoryError::OsError {
                operation: "CreateToolhelp32Snapshot",
                code: ErrorCode::last_error().raw() as i32,
            });
        }

        let mut entry: PROCESSENTRY32W = mem::zeroed();
        entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as DWORD;

        let mut entries = Vec::new();
        let mut more = Process32FirstW(snapshot, &mut entry) != FALSE;
        while more {
            entries.push(SnapshotEntry {
                pid: entry.th32ProcessID,
                exe_name: wide_to_string(&entry.szExeFile),
                thread_count: entry.cntThreads,
            });
            more = Process32NextW(snapshot, &mut entry) != FALSE;
        }

        CloseHandle(snapshot);
        Ok(entries)
    }
}

/// Thread count of `pid` from a snapshot, if the process is listed
pub fn thread_count(pid: ProcessId) -> MemoryResult<Option<u32>> {
    Ok(process_snapshot()?
        .into_iter()
        .find(|entry| entry.pid == pid)
        .map(|entry| entry.thread_count))
}

fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    OsString::from_wide(&wide[..len])
        .to_string_lossy()
        .into_owned()
}
