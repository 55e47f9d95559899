//! In-memory process backend
//!
//! Simulates targets made of byte-backed regions so the session, scanner
//! and command layers can be exercised without privileges or a live
//! process. Every read and write is logged for inspection.

use super::api::ProcessApi;
use crate::core::types::{
    Address, MemoryError, MemoryRegion, MemoryResult, ProcessEntry, ProcessId, ProcessStats,
    Protection,
};
use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Holds every read until [`ReadGate::open`] is called, keeping a scan in
/// flight for as long as a test needs
#[derive(Debug, Clone, Default)]
pub struct ReadGate {
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl ReadGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        let (open, ready) = &*self.state;
        *open.lock().unwrap_or_else(PoisonError::into_inner) = true;
        ready.notify_all();
    }

    fn wait(&self) {
        let (open, ready) = &*self.state;
        let mut guard = open.lock().unwrap_or_else(PoisonError::into_inner);
        while !*guard {
            guard = ready.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// A simulated region of target memory
#[derive(Debug, Clone)]
pub struct MockRegion {
    pub address: u64,
    pub protection: Protection,
    pub bytes: Vec<u8>,
    /// Reads and writes fail even though the protection allows them
    pub faulty: bool,
}

impl MockRegion {
    fn end(&self) -> u64 {
        self.address + self.bytes.len() as u64
    }

    fn span(&self, address: Address, len: usize) -> Option<std::ops::Range<usize>> {
        let start = address.as_u64().checked_sub(self.address)?;
        let end = start.checked_add(len as u64)?;
        if end > self.bytes.len() as u64 {
            return None;
        }
        Some(start as usize..end as usize)
    }
}

/// A simulated target process
#[derive(Debug, Clone)]
pub struct MockProcess {
    pub pid: ProcessId,
    pub name: String,
    pub alive: bool,
    pub deny_attach: bool,
    pub thread_count: u32,
    pub regions: Vec<MockRegion>,
}

impl MockProcess {
    pub fn new(pid: ProcessId, name: impl Into<String>) -> Self {
        MockProcess {
            pid,
            name: name.into(),
            alive: true,
            deny_attach: false,
            thread_count: 1,
            regions: Vec::new(),
        }
    }

    /// Adds a region; regions are kept sorted by address
    pub fn with_region(self, address: u64, protection: Protection, bytes: Vec<u8>) -> Self {
        self.push_region(MockRegion {
            address,
            protection,
            bytes,
            faulty: false,
        })
    }

    /// Adds a region whose reads and writes fail at the OS level
    pub fn with_faulty_region(self, address: u64, protection: Protection, bytes: Vec<u8>) -> Self {
        self.push_region(MockRegion {
            address,
            protection,
            bytes,
            faulty: true,
        })
    }

    /// The OS refuses a memory access handle for this process
    pub fn denied(mut self) -> Self {
        self.deny_attach = true;
        self
    }

    pub fn with_threads(mut self, thread_count: u32) -> Self {
        self.thread_count = thread_count;
        self
    }

    fn push_region(mut self, region: MockRegion) -> Self {
        self.regions.push(region);
        self.regions.sort_by_key(|r| r.address);
        self
    }

    fn region_for(&self, address: Address, len: usize) -> Option<(usize, std::ops::Range<usize>)> {
        self.regions
            .iter()
            .enumerate()
            .find_map(|(index, region)| region.span(address, len).map(|span| (index, span)))
    }
}

/// Handle returned by [`MockProcessApi::open`]
#[derive(Debug, PartialEq, Eq)]
pub struct MockHandle {
    id: u64,
    pid: ProcessId,
}

#[derive(Default)]
struct MockState {
    processes: Vec<MockProcess>,
    next_handle: u64,
    open_handles: HashSet<u64>,
    opened: usize,
    closed: usize,
    reads: Vec<(Address, usize)>,
    writes: Vec<(Address, Vec<u8>)>,
}

impl MockState {
    fn process(&self, pid: ProcessId) -> MemoryResult<&MockProcess> {
        self.processes
            .iter()
            .find(|p| p.pid == pid && p.alive)
            .ok_or_else(|| MemoryError::ProcessNotFound(format!("PID: {}", pid)))
    }

    fn process_mut(&mut self, pid: ProcessId) -> Option<&mut MockProcess> {
        self.processes.iter_mut().find(|p| p.pid == pid)
    }
}

/// In-memory [`ProcessApi`] implementation
#[derive(Default)]
pub struct MockProcessApi {
    state: Mutex<MockState>,
    read_gate: Option<ReadGate>,
}

impl MockProcessApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(self, process: MockProcess) -> Self {
        self.lock().processes.push(process);
        self
    }

    /// Blocks every read on `gate` until it is opened
    pub fn with_read_gate(mut self, gate: ReadGate) -> Self {
        self.read_gate = Some(gate);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of handles handed out so far
    pub fn open_count(&self) -> usize {
        self.lock().opened
    }

    /// Number of handles released so far
    pub fn close_count(&self) -> usize {
        self.lock().closed
    }

    /// Handles currently held by callers
    pub fn live_handles(&self) -> usize {
        self.lock().open_handles.len()
    }

    /// Marks a process as exited
    pub fn kill(&self, pid: ProcessId) {
        if let Some(process) = self.lock().process_mut(pid) {
            process.alive = false;
        }
    }

    /// Every `(address, len)` passed to a read, in call order
    pub fn reads(&self) -> Vec<(Address, usize)> {
        self.lock().reads.clone()
    }

    /// Every `(address, data)` passed to a write, in call order
    pub fn writes(&self) -> Vec<(Address, Vec<u8>)> {
        self.lock().writes.clone()
    }

    pub fn clear_log(&self) {
        let mut state = self.lock();
        state.reads.clear();
        state.writes.clear();
    }

    /// Reads simulated memory directly, bypassing protection and the log
    pub fn peek(&self, pid: ProcessId, address: u64, len: usize) -> Option<Vec<u8>> {
        let state = self.lock();
        let process = state.processes.iter().find(|p| p.pid == pid)?;
        let (index, span) = process.region_for(Address::new(address), len)?;
        Some(process.regions[index].bytes[span].to_vec())
    }

    /// Mutates simulated memory directly, as the running target would
    pub fn poke(&self, pid: ProcessId, address: u64, data: &[u8]) -> bool {
        let mut state = self.lock();
        let Some(process) = state.process_mut(pid) else {
            return false;
        };
        match process.region_for(Address::new(address), data.len()) {
            Some((index, span)) => {
                process.regions[index].bytes[span].copy_from_slice(data);
                true
            }
            None => false,
        }
    }
}

impl ProcessApi for MockProcessApi {
    type Handle = MockHandle;

    fn list_processes(&self) -> MemoryResult<Vec<ProcessEntry>> {
        Ok(self
            .lock()
            .processes
            .iter()
            .filter(|p| p.alive)
            .map(|p| ProcessEntry::new(p.pid, p.name.clone()))
            .collect())
    }

    fn open(&self, pid: ProcessId) -> MemoryResult<MockHandle> {
        let mut state = self.lock();
        if state.process(pid)?.deny_attach {
            return Err(MemoryError::attach_denied(pid, "operation not permitted"));
        }

        state.next_handle += 1;
        let id = state.next_handle;
        state.open_handles.insert(id);
        state.opened += 1;
        Ok(MockHandle { id, pid })
    }

    fn close(&self, handle: MockHandle) {
        let mut state = self.lock();
        if state.open_handles.remove(&handle.id) {
            state.closed += 1;
        }
    }

    fn query_region(
        &self,
        handle: &MockHandle,
        address: Address,
    ) -> MemoryResult<Option<MemoryRegion>> {
        let state = self.lock();
        let process = state.process(handle.pid)?;
        Ok(process
            .regions
            .iter()
            .find(|r| r.end() > address.as_u64())
            .map(|r| MemoryRegion::new(Address::new(r.address), r.bytes.len() as u64, r.protection)))
    }

    fn read(&self, handle: &MockHandle, address: Address, buffer: &mut [u8]) -> MemoryResult<()> {
        if let Some(gate) = &self.read_gate {
            gate.wait();
        }
        let mut state = self.lock();
        state.reads.push((address, buffer.len()));

        let process = state
            .process(handle.pid)
            .map_err(|_| MemoryError::read_failed(address, "process exited"))?;
        let (index, span) = process
            .region_for(address, buffer.len())
            .ok_or_else(|| MemoryError::read_failed(address, "invalid address"))?;
        let region = &process.regions[index];
        if !region.protection.read || region.faulty {
            return Err(MemoryError::read_failed(address, "protection failure"));
        }

        buffer.copy_from_slice(&region.bytes[span]);
        Ok(())
    }

    fn write(&self, handle: &MockHandle, address: Address, data: &[u8]) -> MemoryResult<()> {
        let mut state = self.lock();
        state.writes.push((address, data.to_vec()));

        let process = state
            .process_mut(handle.pid)
            .filter(|p| p.alive)
            .ok_or_else(|| MemoryError::write_failed(address, "process exited"))?;
        let (index, span) = process
            .region_for(address, data.len())
            .ok_or_else(|| MemoryError::write_failed(address, "invalid address"))?;
        let region = &mut process.regions[index];
        if !region.protection.write || region.faulty {
            return Err(MemoryError::write_failed(address, "protection failure"));
        }

        region.bytes[span].copy_from_slice(data);
        Ok(())
    }

    fn process_stats(&self, handle: &MockHandle) -> MemoryResult<ProcessStats> {
        let state = self.lock();
        let process = state.process(handle.pid)?;
        let total = |filter: fn(&MockRegion) -> bool| -> u64 {
            process
                .regions
                .iter()
                .filter(|r| filter(r))
                .map(|r| r.bytes.len() as u64)
                .sum()
        };

        Ok(ProcessStats {
            pid: process.pid,
            virtual_size: total(|_| true),
            resident_size: total(|r| r.protection.read),
            thread_count: process.thread_count,
        })
    }

    fn is_alive(&self, handle: &MockHandle) -> bool {
        self.lock().process(handle.pid).is_ok()
    }
}
