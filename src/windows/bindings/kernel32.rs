//! Kernel32.dll bindings for process and memory operations

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use crate::windows::utils::ErrorCode;
use std::mem;
use winapi::shared::minwindef::{DWORD, FALSE, LPCVOID, LPVOID};
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::{ReadProcessMemory, VirtualQueryEx, WriteProcessMemory};
use winapi::um::minwinbase::STILL_ACTIVE;
use winapi::um::processthreadsapi::{GetExitCodeProcess, OpenProcess};
use winapi::um::winnt::{
    HANDLE, MEMORY_BASIC_INFORMATION, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION,
    PROCESS_VM_READ, PROCESS_VM_WRITE,
};

/// Rights needed to scan, edit and probe a target
pub const SCANNER_ACCESS: DWORD =
    PROCESS_VM_READ | PROCESS_VM_WRITE | PROCESS_VM_OPERATION | PROCESS_QUERY_INFORMATION;

/// Safe wrapper for OpenProcess
pub fn open_process(pid: ProcessId, desired_access: DWORD) -> MemoryResult<HANDLE> {
    unsafe {
        let handle = OpenProcess(desired_access, FALSE, pid);
        if handle.is_null() {
            Err(ErrorCode::last_error().to_attach_error(pid))
        } else {
            Ok(handle)
        }
    }
}

/// Safe wrapper for CloseHandle
///
/// # Safety
/// The handle must be a valid Windows handle
pub unsafe fn close_handle(handle: HANDLE) -> MemoryResult<()> {
    if handle.is_null() {
        return Ok(());
    }

    if CloseHandle(handle) == FALSE {
        Err(MemoryError::OsError {
            operation: "CloseHandle",
            code: ErrorCode::last_error().raw() as i32,
        })
    } else {
        Ok(())
    }
}

/// Safe wrapper for ReadProcessMemory; a short read is an error
///
/// # Safety
/// The handle must be a valid process handle with appropriate access rights
pub unsafe fn read_process_memory(
    handle: HANDLE,
    address: Address,
    buffer: &mut [u8],
) -> MemoryResult<()> {
    let mut bytes_read = 0;

    let result = ReadProcessMemory(
        handle,
        address.as_u64() as LPCVOID,
        buffer.as_mut_ptr() as LPVOID,
        buffer.len(),
        &mut bytes_read,
    );

    if result == FALSE {
        Err(MemoryError::read_failed(
            address,
            ErrorCode::last_error().to_string(),
        ))
    } else if bytes_read != buffer.len() {
        Err(MemoryError::read_failed(
            address,
            format!("short read: {} of {} bytes", bytes_read, buffer.len()),
        ))
    } else {
        Ok(())
    }
}

/// Safe wrapper for WriteProcessMemory; a short write is an error
///
/// # Safety
/// The handle must be a valid process handle with appropriate access rights
pub unsafe fn write_process_memory(
    handle: HANDLE,
    address: Address,
    data: &[u8],
) -> MemoryResult<()> {
    let mut bytes_written = 0;

    let result = WriteProcessMemory(
        handle,
        address.as_u64() as LPVOID,
        data.as_ptr() as LPCVOID,
        data.len(),
        &mut bytes_written,
    );

    if result == FALSE {
        Err(MemoryError::write_failed(
            address,
            ErrorCode::last_error().to_string(),
        ))
    } else if bytes_written != data.len() {
        Err(MemoryError::write_failed(
            address,
            format!("short write: {} of {} bytes", bytes_written, data.len()),
        ))
    } else {
        Ok(())
    }
}

/// Safe wrapper for VirtualQueryEx
///
/// Returns `None` once the address lies beyond the last region of the
/// target's address space.
///
/// # Safety
/// The handle must be a valid process handle with appropriate access rights
pub unsafe fn virtual_query_ex(
    handle: HANDLE,
    address: Address,
) -> MemoryResult<Option<MEMORY_BASIC_INFORMATION>> {
    let mut mbi: MEMORY_BASIC_INFORMATION = mem::zeroed();

    let result = VirtualQueryEx(
        handle,
        address.as_u64() as LPCVOID,
        &mut mbi,
        mem::size_of::<MEMORY_BASIC_INFORMATION>(),
    );

    if result != 0 {
        return Ok(Some(mbi));
    }

    match ErrorCode::last_error() {
        ErrorCode::InvalidParameter => Ok(None),
        other => Err(MemoryError::OsError {
            operation: "VirtualQueryEx",
            code: other.raw() as i32,
        }),
    }
}

/// Whether the process behind `handle` has not exited yet
///
/// # Safety
/// The handle must be a valid process handle with query rights
pub unsafe fn is_process_running(handle: HANDLE) -> bool {
    let mut exit_code: DWORD = 0;
    if GetExitCodeProcess(handle, &mut exit_code) == FALSE {
        return false;
    }
    exit_code == STILL_ACTIVE
}
