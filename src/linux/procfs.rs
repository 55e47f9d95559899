//! procfs implementation of [`ProcessApi`]
//!
//! Memory access goes through `/proc/<pid>/mem`, which needs ptrace access
//! to the target (same user and a permissive `ptrace_scope`, or
//! `CAP_SYS_PTRACE`). Each read and write is a single `pread`/`pwrite`.

use super::maps::{parse_maps_line, parse_status};
use crate::core::types::{
    Address, MemoryError, MemoryRegion, MemoryResult, ProcessEntry, ProcessId, ProcessStats,
};
use crate::process::ProcessApi;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader};
use std::os::unix::fs::FileExt;
use std::path::PathBuf;
use tracing::{debug, warn};

fn proc_path(pid: ProcessId, entry: &str) -> PathBuf {
    PathBuf::from(format!("/proc/{}/{}", pid, entry))
}

fn os_reason(e: &io::Error) -> String {
    match e.raw_os_error() {
        Some(code) => format!("{} (os error {})", e.kind(), code),
        None => e.to_string(),
    }
}

/// Open `/proc/<pid>/mem` of an attached target
#[derive(Debug)]
pub struct ProcfsHandle {
    pid: ProcessId,
    mem: File,
    writable: bool,
}

impl ProcfsHandle {
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }
}

/// Linux process backend built on `/proc`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcfsProcessApi;

impl ProcfsProcessApi {
    pub fn new() -> Self {
        ProcfsProcessApi
    }

    fn process_name(pid: ProcessId) -> Option<String> {
        let from_exe = fs::read_link(proc_path(pid, "exe"))
            .ok()
            .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()));

        from_exe.or_else(|| {
            fs::read_to_string(proc_path(pid, "comm"))
                .ok()
                .map(|comm| comm.trim_end().to_string())
        })
    }
}

impl ProcessApi for ProcfsProcessApi {
    type Handle = ProcfsHandle;

    fn list_processes(&self) -> MemoryResult<Vec<ProcessEntry>> {
        let mut processes: Vec<ProcessEntry> = fs::read_dir("/proc")?
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().to_str()?.parse::<ProcessId>().ok())
            .filter_map(|pid| Some(ProcessEntry::new(pid, Self::process_name(pid)?)))
            .collect();

        processes.sort_by_key(|p| p.pid);
        Ok(processes)
    }

    fn open(&self, pid: ProcessId) -> MemoryResult<ProcfsHandle> {
        if pid == 0 || !proc_path(pid, "").exists() {
            return Err(MemoryError::ProcessNotFound(format!("PID: {}", pid)));
        }

        let path = proc_path(pid, "mem");
        match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(mem) => Ok(ProcfsHandle {
                pid,
                mem,
                writable: true,
            }),
            Err(rw_error) => {
                debug!(pid, error = %rw_error, "Read-write open refused, trying read-only");
                match File::open(&path) {
                    Ok(mem) => {
                        warn!(pid, "Attached read-only, writes will fail");
                        Ok(ProcfsHandle {
                            pid,
                            mem,
                            writable: false,
                        })
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        Err(MemoryError::ProcessNotFound(format!("PID: {}", pid)))
                    }
                    Err(e) => Err(MemoryError::attach_denied(pid, os_reason(&e))),
                }
            }
        }
    }

    fn close(&self, handle: ProcfsHandle) {
        debug!(pid = handle.pid, "Closing /proc mem handle");
        drop(handle);
    }

    fn query_region(
        &self,
        handle: &ProcfsHandle,
        address: Address,
    ) -> MemoryResult<Option<MemoryRegion>> {
        let maps = File::open(proc_path(handle.pid, "maps"))?;

        for line in BufReader::new(maps).lines() {
            let line = line?;
            if let Some(region) = parse_maps_line(&line) {
                if region.end_address() > address {
                    return Ok(Some(region));
                }
            }
        }

        Ok(None)
    }

    fn read(&self, handle: &ProcfsHandle, address: Address, buffer: &mut [u8]) -> MemoryResult<()> {
        match handle.mem.read_at(buffer, address.as_u64()) {
            Ok(n) if n == buffer.len() => Ok(()),
            Ok(n) => Err(MemoryError::read_failed(
                address,
                format!("partial read: expected {} bytes, got {}", buffer.len(), n),
            )),
            Err(e) => Err(MemoryError::read_failed(address, os_reason(&e))),
        }
    }

    fn write(&self, handle: &ProcfsHandle, address: Address, data: &[u8]) -> MemoryResult<()> {
        if !handle.writable {
            return Err(MemoryError::write_failed(address, "handle is read-only"));
        }

        match handle.mem.write_at(data, address.as_u64()) {
            Ok(n) if n == data.len() => Ok(()),
            Ok(n) => Err(MemoryError::write_failed(
                address,
                format!("partial write: expected {} bytes, wrote {}", data.len(), n),
            )),
            Err(e) => Err(MemoryError::write_failed(address, os_reason(&e))),
        }
    }

    fn process_stats(&self, handle: &ProcfsHandle) -> MemoryResult<ProcessStats> {
        let status = fs::read_to_string(proc_path(handle.pid, "status"))?;
        let fields = parse_status(&status);

        Ok(ProcessStats {
            pid: handle.pid,
            virtual_size: fields.vm_size,
            resident_size: fields.vm_rss,
            thread_count: fields.threads,
        })
    }

    fn is_alive(&self, handle: &ProcfsHandle) -> bool {
        match fs::read_to_string(proc_path(handle.pid, "status")) {
            Ok(status) => !matches!(parse_status(&status).state, Some('Z' | 'X')),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_pid() -> ProcessId {
        std::process::id()
    }

    #[test]
    fn test_list_contains_current_process() {
        let processes = ProcfsProcessApi::new().list_processes().unwrap();
        assert!(processes.iter().any(|p| p.pid == current_pid()));
    }

    #[test]
    fn test_open_invalid_process() {
        let api = ProcfsProcessApi::new();
        assert!(matches!(api.open(0), Err(MemoryError::ProcessNotFound(_))));
        assert!(matches!(
            api.open(u32::MAX),
            Err(MemoryError::ProcessNotFound(_))
        ));
    }

    #[test]
    fn test_read_own_memory() {
        let api = ProcfsProcessApi::new();
        let handle = api.open(current_pid()).unwrap();

        let value: u64 = 0x1122_3344_5566_7788;
        let address = Address::from(&value as *const u64 as usize);
        let mut buffer = [0u8; 8];
        api.read(&handle, address, &mut buffer).unwrap();
        assert_eq!(u64::from_le_bytes(buffer), value);

        let mut buffer = [0u8; 4];
        assert!(matches!(
            api.read(&handle, Address::null(), &mut buffer),
            Err(MemoryError::MemoryUnreadable { .. })
        ));

        assert!(api.is_alive(&handle));
        api.close(handle);
    }

    #[test]
    fn test_stats_of_current_process() {
        let api = ProcfsProcessApi::new();
        let handle = api.open(current_pid()).unwrap();
        let stats = api.process_stats(&handle).unwrap();
        assert_eq!(stats.pid, current_pid());
        assert!(stats.thread_count >= 1);
        assert!(stats.virtual_size >= stats.resident_size);
        api.close(handle);
    }
}
