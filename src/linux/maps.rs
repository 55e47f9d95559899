//! Parsing of `/proc/<pid>/maps` and `/proc/<pid>/status`
//!
//! Maps lines look like:
//! address           perms offset  dev   inode   pathname
//! 00400000-00452000 r-xp 00000000 08:02 173521  /usr/bin/ls

use crate::core::types::{Address, MemoryRegion, Protection};

/// Parses the `rwxp` permission column
pub fn parse_permissions(perms: &str) -> Protection {
    let bytes = perms.as_bytes();
    Protection::new(
        bytes.first() == Some(&b'r'),
        bytes.get(1) == Some(&b'w'),
        bytes.get(2) == Some(&b'x'),
    )
}

/// Parses one maps line into a region, ignoring offset, device, inode and path
pub fn parse_maps_line(line: &str) -> Option<MemoryRegion> {
    let mut parts = line.split_whitespace();

    let (start, end) = parts.next()?.split_once('-')?;
    let start = u64::from_str_radix(start, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;
    if end < start {
        return None;
    }

    let protection = parse_permissions(parts.next()?);
    Some(MemoryRegion::new(Address::new(start), end - start, protection))
}

/// Values pulled out of `/proc/<pid>/status`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFields {
    pub vm_size: u64,
    pub vm_rss: u64,
    pub threads: u32,
    pub state: Option<char>,
}

/// Parses the fields of `/proc/<pid>/status` that the engine reports.
///
/// Memory sizes are converted from kB to bytes.
pub fn parse_status(content: &str) -> StatusFields {
    let mut fields = StatusFields::default();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key {
            "VmSize" => fields.vm_size = parse_kb(value),
            "VmRSS" => fields.vm_rss = parse_kb(value),
            "Threads" => fields.threads = value.parse().unwrap_or(0),
            "State" => fields.state = value.chars().next(),
            _ => {}
        }
    }

    fields
}

fn parse_kb(value: &str) -> u64 {
    value
        .split_whitespace()
        .next()
        .and_then(|n| n.parse::<u64>().ok())
        .map_or(0, |kb| kb * 1024)
}
