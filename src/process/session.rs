//! Attachment to a single target process
//!
//! A [`ProcessSession`] is either detached or attached to exactly one
//! target. Attaching to the current target is a no-op, attaching to a
//! different one releases the previous handle first, and dropping the
//! session releases whatever handle it still holds.

use super::api::ProcessApi;
use crate::core::types::{
    Address, MemoryError, MemoryRegion, MemoryResult, ProcessEntry, ProcessId, ProcessStats,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct Attachment<H> {
    pid: ProcessId,
    handle: H,
}

/// Owns the attachment state and performs raw cross-process I/O
pub struct ProcessSession<A: ProcessApi> {
    api: Arc<A>,
    attachment: Option<Attachment<A::Handle>>,
}

impl<A: ProcessApi> ProcessSession<A> {
    /// Opens a detached session over the given OS backend
    pub fn open(api: Arc<A>) -> Self {
        ProcessSession {
            api,
            attachment: None,
        }
    }

    /// Get the OS backend
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Lists the currently running processes
    pub fn list_processes(&self) -> MemoryResult<Vec<ProcessEntry>> {
        self.api.list_processes()
    }

    /// First running process whose name contains `name`, ignoring case
    pub fn find_process(&self, name: &str) -> MemoryResult<ProcessEntry> {
        self.api
            .list_processes()?
            .into_iter()
            .find(|entry| entry.name_contains(name))
            .ok_or_else(|| MemoryError::ProcessNotFound(name.to_string()))
    }

    /// Resolves `name` to a pid and attaches to it
    pub fn attach_by_name(&mut self, name: &str) -> MemoryResult<ProcessId> {
        let entry = self.find_process(name)?;
        debug!(name, pid = entry.pid, process = %entry.name, "Resolved process name");
        self.attach_by_id(entry.pid)?;
        Ok(entry.pid)
    }

    /// Attaches to `pid`, implicitly detaching from any other target
    pub fn attach_by_id(&mut self, pid: ProcessId) -> MemoryResult<()> {
        if self.pid() == Some(pid) {
            debug!(pid, "Already attached");
            return Ok(());
        }

        self.detach();

        match self.api.open(pid) {
            Ok(handle) => {
                self.attachment = Some(Attachment { pid, handle });
                info!(pid, "Attached to process");
                Ok(())
            }
            Err(e) => {
                warn!(pid, error = %e, "Failed to attach to process");
                Err(e)
            }
        }
    }

    /// Releases the memory access handle if one is held
    pub fn detach(&mut self) {
        if let Some(attachment) = self.attachment.take() {
            self.api.close(attachment.handle);
            info!(pid = attachment.pid, "Detached from process");
        }
    }

    /// Pure state query
    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Pid of the current target
    pub fn pid(&self) -> Option<ProcessId> {
        self.attachment.as_ref().map(|a| a.pid)
    }

    /// Liveness probe: detaches when the target has exited
    pub fn check_alive(&mut self) -> bool {
        let alive = match &self.attachment {
            Some(attachment) => self.api.is_alive(&attachment.handle),
            None => return false,
        };

        if !alive {
            warn!(pid = ?self.pid(), "Target process is gone");
            self.detach();
        }
        alive
    }

    /// Walks the target's regions from address 0 upward.
    ///
    /// Yields nothing when detached. Each call starts a fresh walk over the
    /// live process.
    pub fn regions(&self) -> RegionWalker<'_, A> {
        RegionWalker {
            session: self,
            cursor: Some(Address::null()),
        }
    }

    /// Reads exactly `size` bytes, never a partial buffer
    pub fn read_bytes(&self, address: Address, size: usize) -> MemoryResult<Vec<u8>> {
        let attachment = self.attachment.as_ref().ok_or(MemoryError::NotAttached)?;
        let mut buffer = vec![0u8; size];
        if size > 0 {
            self.api.read(&attachment.handle, address, &mut buffer)?;
        }
        Ok(buffer)
    }

    /// Writes all of `data` at `address` with a single OS write
    pub fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        let attachment = self.attachment.as_ref().ok_or(MemoryError::NotAttached)?;
        self.api
            .write(&attachment.handle, address, data)
            .inspect_err(|e| warn!(%address, len = data.len(), error = %e, "Write failed"))
    }

    /// Virtual size, resident size and thread count of the target
    pub fn process_stats(&self) -> Option<ProcessStats> {
        let attachment = self.attachment.as_ref()?;
        match self.api.process_stats(&attachment.handle) {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(pid = attachment.pid, error = %e, "Process info query failed");
                None
            }
        }
    }
}

impl<A: ProcessApi> Drop for ProcessSession<A> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<A: ProcessApi> fmt::Debug for ProcessSession<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSession")
            .field("pid", &self.pid())
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Lazy, non-restartable walk over the target's memory regions
pub struct RegionWalker<'a, A: ProcessApi> {
    session: &'a ProcessSession<A>,
    cursor: Option<Address>,
}

impl<A: ProcessApi> Iterator for RegionWalker<'_, A> {
    type Item = MemoryRegion;

    fn next(&mut self) -> Option<MemoryRegion> {
        let cursor = self.cursor?;
        let Some(attachment) = self.session.attachment.as_ref() else {
            self.cursor = None;
            return None;
        };

        match self.session.api.query_region(&attachment.handle, cursor) {
            Ok(Some(region)) => {
                // Stop on regions that would not move the cursor forward
                self.cursor = region
                    .address
                    .checked_add(region.size)
                    .filter(|next| *next > cursor && region.size > 0);
                Some(region)
            }
            Ok(None) => {
                self.cursor = None;
                None
            }
            Err(e) => {
                warn!(%cursor, error = %e, "Region query failed, ending walk");
                self.cursor = None;
                None
            }
        }
    }
}
