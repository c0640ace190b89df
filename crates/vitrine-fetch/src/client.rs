//! # Catalog Client Seam
//!
//! The async boundary to the remote catalog. The production implementation
//! (HTTP, caching, timeouts) lives outside this workspace; the orchestrators
//! only ever see this trait.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use vitrine_core::ProductRecord;

use crate::error::{FetchError, FetchResult};

// =============================================================================
// Catalog Client Trait
// =============================================================================

/// Remote catalog operations. Both calls may suspend; timeouts are the
/// implementation's responsibility, the orchestrators only react to
/// success or failure.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Resolves a single product by catalog id.
    async fn fetch_by_id(&self, id: i64) -> FetchResult<ProductRecord>;

    /// Fetches one page of the product list, in catalog order.
    async fn fetch_page(&self, offset: u32, limit: u32) -> FetchResult<Vec<ProductRecord>>;
}

// =============================================================================
// Canned Implementation
// =============================================================================

/// In-memory catalog with failure injection and optional artificial
/// latency. Serves tests and previews the way a no-op collaborator would;
/// it also records call counts and the peak number of concurrent
/// `fetch_by_id` calls so tests can assert dispatch behavior.
#[derive(Default)]
pub struct StaticCatalog {
    products: Vec<ProductRecord>,
    latency: Option<Duration>,
    failing_ids: Mutex<HashSet<i64>>,
    fail_pages: AtomicBool,
    by_id_calls: AtomicUsize,
    page_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StaticCatalog {
    /// Creates a catalog serving `products`.
    pub fn new(products: Vec<ProductRecord>) -> Self {
        StaticCatalog {
            products,
            ..Default::default()
        }
    }

    /// Adds a fixed artificial latency to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replaces the set of ids whose `fetch_by_id` fails with a transport
    /// error.
    pub fn set_failing(&self, ids: impl IntoIterator<Item = i64>) {
        *self.failing_ids.lock().expect("failing set mutex poisoned") = ids.into_iter().collect();
    }

    /// Makes `fetch_page` fail (or succeed again).
    pub fn set_page_failure(&self, fail: bool) {
        self.fail_pages.store(fail, Ordering::SeqCst);
    }

    /// Number of `fetch_by_id` calls served so far.
    pub fn by_id_calls(&self) -> usize {
        self.by_id_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_page` calls served so far.
    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    /// Peak number of concurrently outstanding `fetch_by_id` calls.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl CatalogClient for StaticCatalog {
    async fn fetch_by_id(&self, id: i64) -> FetchResult<ProductRecord> {
        self.by_id_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        self.simulate_latency().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failing = self
            .failing_ids
            .lock()
            .expect("failing set mutex poisoned")
            .contains(&id);
        if failing {
            return Err(FetchError::Transport(format!(
                "injected failure for product {id}"
            )));
        }

        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(FetchError::NotFound(id))
    }

    async fn fetch_page(&self, offset: u32, limit: u32) -> FetchResult<Vec<ProductRecord>> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(FetchError::Transport("injected page failure".into()));
        }

        Ok(self
            .products
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
