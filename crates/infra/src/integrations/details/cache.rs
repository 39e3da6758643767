//! TTL cache in front of a [`DetailsLookup`]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use plansync_core::DetailsLookup;
use plansync_domain::{Result, WorkOrderDetails};
use tracing::trace;

const MAX_ENTRIES: u64 = 10_000;

/// Reuses successful lookups for a fixed time. Failures are not cached.
pub struct CachedDetailsLookup {
    inner: Arc<dyn DetailsLookup>,
    cache: Cache<String, WorkOrderDetails>,
}

impl CachedDetailsLookup {
    pub fn new(inner: Arc<dyn DetailsLookup>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(MAX_ENTRIES).time_to_live(ttl).build();
        Self { inner, cache }
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

#[async_trait]
impl DetailsLookup for CachedDetailsLookup {
    async fn get_details(&self, order_id: &str) -> Result<WorkOrderDetails> {
        if let Some(hit) = self.cache.get(order_id).await {
            trace!(order_id, "Details cache hit");
            return Ok(hit);
        }
        let details = self.inner.get_details(order_id).await?;
        self.cache.insert(order_id.to_string(), details.clone()).await;
        Ok(details)
    }
}
