//! Block timestamp memoization.

use dashmap::DashMap;
use std::sync::Arc;

use crate::blockchain::client::ChainRpc;
use crate::blockchain::types::BlockchainResult;
use crate::observability::metrics;

/// Process-lifetime map of block number to block timestamp.
///
/// Mined blocks never change, so entries are never evicted or replaced.
#[derive(Clone, Default)]
pub struct BlockTimestampCache {
    inner: Arc<DashMap<u64, u64>>,
}

impl BlockTimestampCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached timestamp of a block, if any.
    pub fn get(&self, block_number: u64) -> Option<u64> {
        self.inner.get(&block_number).map(|r| *r.value())
    }

    /// Return the cached timestamp or fetch and remember it.
    ///
    /// Two concurrent misses on one block may both fetch; the first write wins.
    pub async fn get_or_fetch(
        &self,
        chain: &dyn ChainRpc,
        block_number: u64,
    ) -> BlockchainResult<u64> {
        if let Some(timestamp) = self.get(block_number) {
            return Ok(timestamp);
        }

        let fetched = chain.block_timestamp(block_number).await?;
        let timestamp = *self.inner.entry(block_number).or_insert(fetched);
        metrics::record_cache_size(self.inner.len());
        tracing::trace!(block_number, timestamp, "Cached block timestamp");
        Ok(timestamp)
    }

    /// Number of cached blocks.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no timestamp has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
