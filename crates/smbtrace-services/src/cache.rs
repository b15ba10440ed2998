//! Per-packet detail cache.
//!
//! Keyed by frame number. Each key holds a once-cell, so the fetch for a
//! given packet runs at most once even when requests for it overlap; the
//! other requesters wait on the same cell. A fetch that produced no markup
//! leaves the cell empty. Markup that came back but did not parse is still
//! stored, with no tree, so the tool is never asked for that packet again.
//!
//! Entries are never evicted while the capture stays loaded. Growth is
//! bounded by how many packets the user actually opens.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::OnceCell;

use smbtrace_core::{DetailNode, FetchError};

/// Raw detail markup for one packet together with its parsed tree.
#[derive(Debug, Clone)]
pub struct CachedDetail {
    pub markup: Bytes,
    /// `None` when the markup did not parse.
    pub tree: Option<Arc<DetailNode>>,
}

impl CachedDetail {
    pub fn new(markup: Bytes, tree: Option<DetailNode>) -> Self {
        Self {
            markup,
            tree: tree.map(Arc::new),
        }
    }
}

#[derive(Default)]
pub struct DetailCache {
    /// frame number → fill-once slot
    entries: DashMap<u32, Arc<OnceCell<CachedDetail>>>,
}

impl DetailCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entry for `number`, running `fetch` to fill it on a miss.
    pub async fn get_or_fetch<F, Fut>(&self, number: u32, fetch: F) -> Result<CachedDetail, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedDetail, FetchError>>,
    {
        // Shard lock is dropped at the end of this statement, before any await.
        let cell = Arc::clone(&self.entries.entry(number).or_default());
        let detail = cell.get_or_try_init(fetch).await?;
        Ok(detail.clone())
    }

    /// Cached entry for `number`, without fetching.
    pub fn get(&self, number: u32) -> Option<CachedDetail> {
        self.entries
            .get(&number)
            .and_then(|cell| cell.value().get().cloned())
    }

    pub fn contains(&self, number: u32) -> bool {
        self.entries
            .get(&number)
            .is_some_and(|cell| cell.value().initialized())
    }

    /// Number of filled entries.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
