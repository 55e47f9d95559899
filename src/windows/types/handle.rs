//! Safe HANDLE wrapper with automatic cleanup

use crate::core::types::ProcessId;
use crate::windows::bindings::kernel32;
use std::ptr;
use winapi::um::winnt::HANDLE;

/// Process handle owned by an attachment, closed on drop
pub struct Handle {
    handle: HANDLE,
    pid: ProcessId,
}

impl Handle {
    /// Create a new Handle wrapper
    pub fn new(handle: HANDLE, pid: ProcessId) -> Self {
        Handle { handle, pid }
    }

    /// Check if handle is null
    pub fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    /// Get the raw handle
    pub fn raw(&self) -> HANDLE {
        self.handle
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            // Ignore errors on cleanup
            unsafe {
                let _ = kernel32::close_handle(self.handle);
            }
            self.handle = ptr::null_mut();
        }
    }
}

// Send + Sync are safe because HANDLEs are process-local
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}
