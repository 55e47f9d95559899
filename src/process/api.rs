//! OS process-memory capability interface
//!
//! Everything platform specific sits behind [`ProcessApi`]. The session,
//! scanner and command layers only ever talk to this trait, so they run
//! unchanged against the procfs backend, the Win32 backend or the in-memory
//! mock used by the tests.

use crate::core::types::{
    Address, MemoryRegion, MemoryResult, ProcessEntry, ProcessId, ProcessStats,
};

pub trait ProcessApi: Send + Sync + 'static {
    /// OS-level memory access handle for one target
    type Handle: Send + Sync;

    /// Lists the currently running processes
    fn list_processes(&self) -> MemoryResult<Vec<ProcessEntry>>;

    /// Obtains a memory access handle.
    ///
    /// Fails with `ProcessNotFound` for an unknown pid and `AttachDenied`
    /// when the OS refuses access.
    fn open(&self, pid: ProcessId) -> MemoryResult<Self::Handle>;

    /// Releases a handle obtained from [`ProcessApi::open`]
    fn close(&self, handle: Self::Handle);

    /// Returns the first region that ends above `address`, or `None` past the
    /// end of the address space. The returned region may start above
    /// `address` when there is a gap.
    fn query_region(
        &self,
        handle: &Self::Handle,
        address: Address,
    ) -> MemoryResult<Option<MemoryRegion>>;

    /// Fills `buffer` completely with one OS read, or fails
    fn read(&self, handle: &Self::Handle, address: Address, buffer: &mut [u8])
        -> MemoryResult<()>;

    /// Writes all of `data` with one OS write, or fails
    fn write(&self, handle: &Self::Handle, address: Address, data: &[u8]) -> MemoryResult<()>;

    /// Resource usage summary of the target
    fn process_stats(&self, handle: &Self::Handle) -> MemoryResult<ProcessStats>;

    /// Whether the target behind `handle` is still running
    fn is_alive(&self, handle: &Self::Handle) -> bool;
}
