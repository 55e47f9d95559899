//! Typed value search over the target's memory
//!
//! A full search walks every readable region whose start lies in the
//! requested address range, reads each region once and compares it in
//! non-overlapping windows of the value type's width. Refinement (nearby
//! search) instead re-reads a single window relative to each existing
//! result. Both replace the [`ResultSet`] in one swap.

use super::results::ResultSet;
use super::writer;
use crate::config::ScannerConfig;
use crate::core::types::{
    Address, FloatTolerance, MemoryError, MemoryRegion, MemoryResult, NumericType, SearchQuery,
    SearchResult, TypedValue, ValueRange,
};
use crate::process::{ProcessApi, ProcessSession};
use rayon::prelude::*;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Options for memory scanning
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Float equality tolerance
    pub tolerance: FloatTolerance,
    /// Region length in bytes from which windows are compared in parallel
    pub parallel_threshold: usize,
    /// Worker threads for parallel comparison
    pub max_threads: usize,
    /// Regions larger than this are skipped
    pub max_region_size: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions::from(&ScannerConfig::default())
    }
}

impl From<&ScannerConfig> for ScanOptions {
    fn from(config: &ScannerConfig) -> Self {
        ScanOptions {
            tolerance: FloatTolerance::new(config.float_tolerance),
            parallel_threshold: config.parallel_threshold,
            max_threads: config.max_threads,
            max_region_size: config.max_region_size,
        }
    }
}

/// Compares `bytes` in non-overlapping windows of the query's width.
///
/// Window `i` is reported at `base + i * width`. A trailing partial window
/// is ignored.
pub fn scan_windows(
    bytes: &[u8],
    base: Address,
    query: &SearchQuery,
    tolerance: FloatTolerance,
) -> Vec<SearchResult> {
    let value_type = query.numeric_type();
    bytes
        .chunks_exact(value_type.width())
        .enumerate()
        .filter_map(|(index, window)| match_window(window, index, base, query, tolerance))
        .collect()
}

/// Parallel form of [`scan_windows`]; results keep ascending address order
pub fn par_scan_windows(
    bytes: &[u8],
    base: Address,
    query: &SearchQuery,
    tolerance: FloatTolerance,
) -> Vec<SearchResult> {
    let value_type = query.numeric_type();
    bytes
        .par_chunks_exact(value_type.width())
        .enumerate()
        .filter_map(|(index, window)| match_window(window, index, base, query, tolerance))
        .collect()
}

fn match_window(
    window: &[u8],
    index: usize,
    base: Address,
    query: &SearchQuery,
    tolerance: FloatTolerance,
) -> Option<SearchResult> {
    let value = TypedValue::decode(window, query.numeric_type()).ok()?;
    if !query.matches(&value, tolerance) {
        return None;
    }
    let offset = (index * window.len()) as u64;
    Some(SearchResult::new(base.checked_add(offset)?, value))
}

/// Holds the result set and runs searches, refinements and bulk edits.
///
/// Operations that replace or consume the result set are serialized by an
/// internal lock so they never interleave.
pub struct ScanEngine {
    options: ScanOptions,
    results: ResultSet,
    scan_lock: Mutex<()>,
    pool: rayon::ThreadPool,
}

impl ScanEngine {
    /// Create a new engine with an empty result set
    pub fn new(options: ScanOptions) -> MemoryResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.max_threads.max(1))
            .thread_name(|index| format!("memprobe-scan-{}", index))
            .build()
            .map_err(|e| MemoryError::Worker(e.to_string()))?;

        Ok(ScanEngine {
            options,
            results: ResultSet::new(),
            scan_lock: Mutex::new(()),
            pool,
        })
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.scan_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clears the results and searches for `text`, which is either a single
    /// literal or a `min~max` range. A detached session leaves the results
    /// untouched.
    pub fn search_exact<A: ProcessApi>(
        &self,
        session: &ProcessSession<A>,
        text: &str,
        value_type: NumericType,
        low: Address,
        high: Address,
    ) -> MemoryResult<usize> {
        let _guard = self.lock();
        if !session.is_attached() {
            return Err(MemoryError::NotAttached);
        }
        self.results.clear();
        let query = SearchQuery::parse(text, value_type)?;
        self.run_search(session, &query, low, high)
    }

    /// Clears the results and searches for values inside `min~max`
    pub fn search_range<A: ProcessApi>(
        &self,
        session: &ProcessSession<A>,
        text: &str,
        value_type: NumericType,
        low: Address,
        high: Address,
    ) -> MemoryResult<usize> {
        let _guard = self.lock();
        if !session.is_attached() {
            return Err(MemoryError::NotAttached);
        }
        self.results.clear();
        let range = ValueRange::parse(text, value_type)?;
        self.run_search(session, &SearchQuery::Range(range), low, high)
    }

    fn run_search<A: ProcessApi>(
        &self,
        session: &ProcessSession<A>,
        query: &SearchQuery,
        low: Address,
        high: Address,
    ) -> MemoryResult<usize> {
        let started = Instant::now();
        let mut found = Vec::new();
        let mut scanned = 0usize;

        for region in session.regions().take_while(|r| r.address < high) {
            if region.address < low || !region.is_readable() {
                continue;
            }
            if region.size > self.options.max_region_size {
                warn!(
                    address = %region.address,
                    size = region.size,
                    limit = self.options.max_region_size,
                    "Skipping region larger than max_region_size; results may be incomplete"
                );
                continue;
            }

            if let Some(mut matches) = self.scan_region(session, &region, query) {
                scanned += 1;
                found.append(&mut matches);
            }
        }

        let count = found.len();
        self.results.replace(found);
        info!(
            query = ?query,
            regions = scanned,
            results = count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search complete"
        );
        Ok(count)
    }

    fn scan_region<A: ProcessApi>(
        &self,
        session: &ProcessSession<A>,
        region: &MemoryRegion,
        query: &SearchQuery,
    ) -> Option<Vec<SearchResult>> {
        let size = usize::try_from(region.size).ok()?;
        let bytes = match session.read_bytes(region.address, size) {
            Ok(bytes) => bytes,
            Err(e) if e.is_recoverable() => {
                debug!(address = %region.address, size, error = %e, "Skipping unreadable region");
                return None;
            }
            Err(e) => {
                warn!(address = %region.address, size, error = %e, "Region read failed");
                return None;
            }
        };

        let tolerance = self.options.tolerance;
        if bytes.len() >= self.options.parallel_threshold {
            Some(
                self.pool
                    .install(|| par_scan_windows(&bytes, region.address, query, tolerance)),
            )
        } else {
            Some(scan_windows(&bytes, region.address, query, tolerance))
        }
    }

    /// Narrows the current results to candidates `offset` bytes away that
    /// match `text`. The new results hold the candidate addresses.
    pub fn search_nearby<A: ProcessApi>(
        &self,
        session: &ProcessSession<A>,
        text: &str,
        value_type: NumericType,
        offset: i64,
    ) -> MemoryResult<usize> {
        let _guard = self.lock();
        if !session.is_attached() {
            return Err(MemoryError::NotAttached);
        }

        let previous = self.results.snapshot();
        if previous.is_empty() {
            return Err(MemoryError::NoPriorResults);
        }
        let query = SearchQuery::parse(text, value_type)?;
        let tolerance = self.options.tolerance;

        let refined: Vec<SearchResult> = previous
            .iter()
            .filter_map(|result| {
                let candidate = result.address.checked_offset(offset)?;
                let bytes = session.read_bytes(candidate, value_type.width()).ok()?;
                let value = TypedValue::decode(&bytes, value_type).ok()?;
                query
                    .matches(&value, tolerance)
                    .then(|| SearchResult::new(candidate, value))
            })
            .collect();

        let count = refined.len();
        self.results.replace(refined);
        info!(
            offset,
            previous = previous.len(),
            results = count,
            "Nearby search complete"
        );
        Ok(count)
    }

    /// Writes `value` at every current result address; returns the number
    /// of successful writes
    pub fn edit_all<A: ProcessApi>(
        &self,
        session: &ProcessSession<A>,
        value: &TypedValue,
    ) -> MemoryResult<usize> {
        let _guard = self.lock();
        if !session.is_attached() {
            return Err(MemoryError::NotAttached);
        }

        let targets = self.results.snapshot();
        let written = writer::write_all(session, targets.iter().map(|r| r.address), value);
        info!(
            value = %value,
            attempted = targets.len(),
            written,
            "Edit all complete"
        );
        Ok(written)
    }

    pub fn clear(&self) {
        let _guard = self.lock();
        self.results.clear();
        debug!("Results cleared");
    }
}

impl std::fmt::Debug for ScanEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanEngine")
            .field("options", &self.options)
            .field("results", &self.results.len())
            .finish()
    }
}
