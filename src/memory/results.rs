//! The engine's current result set
//!
//! Readers always see a complete set: searches build a new vector off to the
//! side and swap it in under the lock, so a half-built set is never visible.

use crate::core::types::SearchResult;
use std::sync::{Arc, PoisonError, RwLock};

/// Ordered, atomically replaced sequence of search results
#[derive(Debug, Default)]
pub struct ResultSet {
    inner: RwLock<Arc<Vec<SearchResult>>>,
}

impl ResultSet {
    pub fn new() -> Self {
        ResultSet::default()
    }

    /// Immutable view of the set as it is right now
    pub fn snapshot(&self) -> Arc<Vec<SearchResult>> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swaps in a complete new set
    pub fn replace(&self, results: Vec<SearchResult>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(results);
    }

    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First `min(max, len)` results in insertion order; non-positive `max`
    /// yields nothing
    pub fn prefix(&self, max: i64) -> Vec<SearchResult> {
        let Ok(max) = usize::try_from(max) else {
            return Vec::new();
        };
        let snapshot = self.snapshot();
        snapshot.iter().take(max).copied().collect()
    }
}
