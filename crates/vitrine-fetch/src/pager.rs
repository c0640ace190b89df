//! # Paginated / Searchable List Loader
//!
//! Incremental paging with client-side search filtering layered on top of
//! the full accumulated result set.
//!
//! ## Merge Rules
//! - `load(0, limit)` replaces both the accumulator and the filtered view
//!   (initial load and pull-to-refresh); it is reentrancy-guarded but not
//!   debounced.
//! - `load(offset > 0, limit)` appends to the accumulator and - if the
//!   active query matches (or is empty) - to the filtered view; appends
//!   are debounced.
//! - A failed page publishes `Error` and leaves everything accumulated so
//!   far in place; partial failure never erases loaded pages.
//! - `search` is synchronous and never touches network state or cursors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use url::Url;
use vitrine_core::{format_price_cents, LoadState, ProductRecord};
use vitrine_store::publisher::{Publisher, Subscription};

use crate::client::CatalogClient;

// =============================================================================
// Configuration
// =============================================================================

/// Page size callers typically pass to [`CatalogPager::load`].
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Minimum interval between two accepted append loads.
pub const DEFAULT_PAGER_DEBOUNCE: Duration = Duration::from_millis(500);

/// Tuning knobs for [`CatalogPager`].
#[derive(Debug, Clone)]
pub struct PagerConfig {
    /// Debounce window for `offset > 0` loads; a call inside it is
    /// dropped, not queued.
    pub debounce: Duration,
}

impl Default for PagerConfig {
    fn default() -> Self {
        PagerConfig {
            debounce: DEFAULT_PAGER_DEBOUNCE,
        }
    }
}

// =============================================================================
// Published Tile
// =============================================================================

/// Presentation form of one product row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTile {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub image_ref: Option<Url>,
}

impl ProductTile {
    fn from_record(product: &ProductRecord) -> Self {
        ProductTile {
            id: product.id,
            title: product.name.clone(),
            subtitle: format!(
                "{} • {}",
                product.category,
                format_price_cents(product.price_cents)
            ),
            image_ref: product.image_ref.clone(),
        }
    }
}

// =============================================================================
// Pagination State
// =============================================================================

/// Accumulated paging/filter state, owned exclusively by the pager.
#[derive(Debug, Clone)]
pub struct PaginationState {
    /// Every record fetched so far, in fetch-returned order.
    pub all_items: Vec<ProductRecord>,

    /// The records matching `current_query` (all of them when empty).
    pub filtered_items: Vec<ProductRecord>,

    /// Active search query, trimmed.
    pub current_query: String,

    /// Whether the last page came back full, i.e. more may exist.
    pub has_more: bool,

    /// A page fetch is outstanding (any offset).
    pub is_fetching_more: bool,
}

impl Default for PaginationState {
    fn default() -> Self {
        PaginationState {
            all_items: Vec::new(),
            filtered_items: Vec::new(),
            current_query: String::new(),
            has_more: true,
            is_fetching_more: false,
        }
    }
}

// =============================================================================
// Catalog Pager
// =============================================================================

struct PagerInner {
    pagination: PaginationState,
    last_dispatch: Option<Instant>,
}

/// Incremental, searchable product-list loader.
pub struct CatalogPager {
    client: Arc<dyn CatalogClient>,
    publisher: Publisher<LoadState<ProductTile>>,
    inner: Mutex<PagerInner>,

    /// Latest-request-wins token; a stale page merge is discarded.
    generation: AtomicU64,
    config: PagerConfig,
}

impl CatalogPager {
    /// Creates a pager with default configuration, starting `Idle`.
    pub fn new(client: Arc<dyn CatalogClient>) -> Arc<Self> {
        Self::with_config(client, PagerConfig::default())
    }

    /// Creates a pager with explicit configuration.
    pub fn with_config(client: Arc<dyn CatalogClient>, config: PagerConfig) -> Arc<Self> {
        Arc::new(CatalogPager {
            client,
            publisher: Publisher::new(LoadState::Idle),
            inner: Mutex::new(PagerInner {
                pagination: PaginationState::default(),
                last_dispatch: None,
            }),
            generation: AtomicU64::new(0),
            config,
        })
    }

    /// Current published state.
    pub fn state(&self) -> LoadState<ProductTile> {
        self.publisher.latest()
    }

    /// Snapshot of the paging/filter state.
    pub fn pagination(&self) -> PaginationState {
        self.inner().pagination.clone()
    }

    /// Subscribes to state transitions (current state delivered
    /// immediately).
    pub fn subscribe(
        &self,
        callback: impl Fn(&LoadState<ProductTile>) + Send + Sync + 'static,
    ) -> Subscription {
        self.publisher.subscribe(callback)
    }

    /// Watch-channel view of the state stream for async consumers.
    pub fn watch(&self) -> tokio::sync::watch::Receiver<LoadState<ProductTile>> {
        self.publisher.watch()
    }

    /// Dispatches a page fetch.
    ///
    /// `offset == 0` replaces everything on success (initial load and
    /// pull-to-refresh). `offset > 0` appends, and is debounced. Either
    /// way the call is dropped while a page fetch is outstanding.
    pub fn load(self: &Arc<Self>, offset: u32, limit: u32) {
        let generation = {
            let mut inner = self.inner();
            if inner.pagination.is_fetching_more {
                debug!(offset, "page load ignored: fetch already outstanding");
                return;
            }
            if offset > 0 {
                if let Some(last) = inner.last_dispatch {
                    if last.elapsed() < self.config.debounce {
                        debug!(offset, "page load dropped: inside debounce window");
                        return;
                    }
                }
            }

            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            inner.pagination.is_fetching_more = true;
            inner.last_dispatch = Some(Instant::now());

            self.publisher.publish(if offset == 0 {
                LoadState::Loading
            } else {
                LoadState::LoadingMore
            });
            generation
        };

        debug!(offset, limit, generation, "page dispatched");
        let pager = Arc::clone(self);
        tokio::spawn(async move { pager.run_page(generation, offset, limit).await });
    }

    /// Synchronous client-side filter over the accumulator.
    ///
    /// Trims the query; empty restores the full accumulator, non-empty
    /// keeps records whose name or category contains the query
    /// (case-insensitive). Always republishes `Loaded` with the new
    /// filtered view; never touches network state or cursors.
    pub fn search(&self, query: &str) {
        let mut inner = self.inner();
        let trimmed = query.trim().to_string();

        inner.pagination.filtered_items = if trimmed.is_empty() {
            inner.pagination.all_items.clone()
        } else {
            inner
                .pagination
                .all_items
                .iter()
                .filter(|p| matches_query(p, &trimmed))
                .cloned()
                .collect()
        };
        inner.pagination.current_query = trimmed;

        debug!(
            query = %inner.pagination.current_query,
            matches = inner.pagination.filtered_items.len(),
            "search filter applied"
        );
        self.publish_loaded(&inner);
    }

    /// Bounds-checked lookup into the filtered view.
    pub fn did_select_item(&self, index: usize) -> Option<ProductRecord> {
        self.inner().pagination.filtered_items.get(index).cloned()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn inner(&self) -> std::sync::MutexGuard<'_, PagerInner> {
        self.inner.lock().expect("pager mutex poisoned")
    }

    fn publish_loaded(&self, inner: &PagerInner) {
        let tiles = inner
            .pagination
            .filtered_items
            .iter()
            .map(ProductTile::from_record)
            .collect();
        self.publisher.publish(LoadState::Loaded(tiles));
    }

    async fn run_page(self: Arc<Self>, generation: u64, offset: u32, limit: u32) {
        let result = self.client.fetch_page(offset, limit).await;

        let mut inner = self.inner();
        if self.generation.load(Ordering::SeqCst) != generation {
            // A newer dispatch owns the state now.
            debug!(generation, "page result discarded: superseded");
            return;
        }

        match result {
            Ok(page) => {
                let fetched = page.len();
                if offset == 0 {
                    // Replace-all resets the filtered view to the raw page;
                    // the active query applies again from the next search
                    // or append.
                    inner.pagination.all_items = page.clone();
                    inner.pagination.filtered_items = page;
                } else {
                    inner.pagination.all_items.extend(page.iter().cloned());
                    let query = inner.pagination.current_query.clone();
                    let additions = page
                        .into_iter()
                        .filter(|p| query.is_empty() || matches_query(p, &query));
                    inner.pagination.filtered_items.extend(additions);
                }
                inner.pagination.has_more = fetched >= limit as usize;

                debug!(
                    offset,
                    fetched,
                    accumulated = inner.pagination.all_items.len(),
                    has_more = inner.pagination.has_more,
                    "page merged"
                );
                self.publish_loaded(&inner);
            }
            Err(e) => {
                // Previously accumulated pages survive a failed fetch.
                warn!(offset, limit, error = %e, "page fetch failed");
                self.publisher.publish(LoadState::Error(e.to_string()));
            }
        }
        inner.pagination.is_fetching_more = false;
    }
}

fn matches_query(product: &ProductRecord, query: &str) -> bool {
    let query = query.to_lowercase();
    product.name.to_lowercase().contains(&query)
        || product.category.to_lowercase().contains(&query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StaticCatalog;

    fn product(id: i64, name: &str, category: &str) -> ProductRecord {
        ProductRecord {
            id,
            name: name.to_string(),
            category: category.to_string(),
            price_cents: 100 * id,
            image_ref: None,
            stock_count: 5,
            rating: 4.0,
            description: String::new(),
        }
    }

    fn numbered(count: i64) -> Vec<ProductRecord> {
        (1..=count)
            .map(|id| {
                let category = if id % 2 == 0 { "Mugs" } else { "Pads" };
                product(id, &format!("Product {id}"), category)
            })
            .collect()
    }

    fn no_debounce() -> PagerConfig {
        PagerConfig {
            debounce: Duration::ZERO,
        }
    }

    async fn settle(pager: &Arc<CatalogPager>) {
        while pager.pagination().is_fetching_more {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load_then_short_page_flips_has_more() {
        let catalog = Arc::new(StaticCatalog::new(numbered(25)));
        let pager = CatalogPager::with_config(catalog, no_debounce());

        pager.load(0, 20);
        settle(&pager).await;

        let pagination = pager.pagination();
        assert_eq!(pagination.all_items.len(), 20);
        assert!(pagination.has_more);
        assert_eq!(pager.state().items().unwrap().len(), 20);

        pager.load(20, 20);
        settle(&pager).await;

        let pagination = pager.pagination();
        assert_eq!(pagination.all_items.len(), 25);
        assert!(!pagination.has_more);
        // appended page preserves fetch-returned order
        assert_eq!(pagination.all_items[20].id, 21);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offset_zero_replaces_accumulator() {
        let catalog = Arc::new(StaticCatalog::new(numbered(25)));
        let pager = CatalogPager::with_config(catalog, no_debounce());

        pager.load(0, 20);
        settle(&pager).await;
        pager.load(20, 20);
        settle(&pager).await;
        assert_eq!(pager.pagination().all_items.len(), 25);

        // pull-to-refresh
        pager.load(0, 20);
        settle(&pager).await;
        assert_eq!(pager.pagination().all_items.len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_page_keeps_accumulated_data() {
        let catalog = Arc::new(StaticCatalog::new(numbered(25)));
        let pager = CatalogPager::with_config(catalog.clone(), no_debounce());

        pager.load(0, 20);
        settle(&pager).await;

        catalog.set_page_failure(true);
        pager.load(20, 20);
        settle(&pager).await;

        assert!(matches!(pager.state(), LoadState::Error(_)));
        let pagination = pager.pagination();
        assert_eq!(pagination.all_items.len(), 20);
        assert_eq!(pagination.filtered_items.len(), 20);

        // a later successful append still works on top of the kept data
        catalog.set_page_failure(false);
        pager.load(20, 20);
        settle(&pager).await;
        assert_eq!(pager.pagination().all_items.len(), 25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_filters_case_insensitively_and_restores() {
        let catalog = Arc::new(StaticCatalog::new(vec![
            product(1, "Coffee Mug", "Kitchen"),
            product(2, "Mouse Pad", "Desk"),
            product(3, "Travel mug", "Kitchen"),
        ]));
        let pager = CatalogPager::with_config(catalog, no_debounce());

        pager.load(0, 20);
        settle(&pager).await;

        pager.search("  MUG ");
        let items = pager.pagination().filtered_items;
        assert_eq!(items.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 3]);

        // category matches too
        pager.search("desk");
        assert_eq!(pager.pagination().filtered_items[0].id, 2);

        // empty query restores the full accumulator
        pager.search("");
        assert_eq!(pager.pagination().filtered_items.len(), 3);
        assert_eq!(pager.state().items().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_append_respects_active_query() {
        let mut products = vec![
            product(1, "Coffee Mug", "Kitchen"),
            product(2, "Mouse Pad", "Desk"),
        ];
        products.push(product(3, "Beer Mug", "Kitchen"));
        products.push(product(4, "Desk Lamp", "Office"));
        let catalog = Arc::new(StaticCatalog::new(products));
        let pager = CatalogPager::with_config(catalog, no_debounce());

        pager.load(0, 2);
        settle(&pager).await;
        pager.search("mug");
        assert_eq!(pager.pagination().filtered_items.len(), 1);

        pager.load(2, 2);
        settle(&pager).await;

        let pagination = pager.pagination();
        assert_eq!(pagination.all_items.len(), 4);
        // only "Beer Mug" joined the filtered view
        assert_eq!(
            pagination
                .filtered_items
                .iter()
                .map(|p| p.id)
                .collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(pagination.current_query, "mug");
    }

    #[tokio::test(start_paused = true)]
    async fn test_appends_are_debounced_but_refreshes_are_not() {
        let catalog = Arc::new(StaticCatalog::new(numbered(60)));
        let pager = CatalogPager::with_config(
            catalog.clone(),
            PagerConfig {
                debounce: Duration::from_millis(500),
            },
        );

        pager.load(0, 20);
        settle(&pager).await;
        assert_eq!(catalog.page_calls(), 1);

        // append inside the window: dropped
        pager.load(20, 20);
        settle(&pager).await;
        assert_eq!(catalog.page_calls(), 1);
        assert_eq!(pager.pagination().all_items.len(), 20);

        // refresh inside the window: accepted (offset 0 is never debounced)
        pager.load(0, 20);
        settle(&pager).await;
        assert_eq!(catalog.page_calls(), 2);

        // append past the window: accepted
        tokio::time::advance(Duration::from_millis(600)).await;
        pager.load(20, 20);
        settle(&pager).await;
        assert_eq!(catalog.page_calls(), 3);
        assert_eq!(pager.pagination().all_items.len(), 40);
    }

    #[tokio::test(start_paused = true)]
    async fn test_any_load_is_dropped_while_fetch_outstanding() {
        let catalog = Arc::new(
            StaticCatalog::new(numbered(60)).with_latency(Duration::from_millis(50)),
        );
        let pager = CatalogPager::with_config(catalog.clone(), no_debounce());

        pager.load(0, 20);
        pager.load(20, 20); // dropped: outstanding
        pager.load(0, 20); // dropped: outstanding, offset 0 included
        settle(&pager).await;

        assert_eq!(catalog.page_calls(), 1);
        assert_eq!(pager.pagination().all_items.len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_states_published_in_order() {
        let catalog = Arc::new(StaticCatalog::new(numbered(60)));
        let pager = CatalogPager::with_config(catalog, no_debounce());

        let states = Arc::new(Mutex::new(Vec::new()));
        let states2 = Arc::clone(&states);
        let _sub = pager.subscribe(move |s| states2.lock().unwrap().push(s.to_string()));

        pager.load(0, 20);
        settle(&pager).await;
        pager.load(20, 20);
        settle(&pager).await;

        assert_eq!(
            *states.lock().unwrap(),
            vec![
                "idle",
                "loading",
                "loaded(20)",
                "loading-more",
                "loaded(40)"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_did_select_item_bounds_checked_on_filtered_view() {
        let catalog = Arc::new(StaticCatalog::new(vec![
            product(1, "Coffee Mug", "Kitchen"),
            product(2, "Mouse Pad", "Desk"),
        ]));
        let pager = CatalogPager::with_config(catalog, no_debounce());

        pager.load(0, 20);
        settle(&pager).await;
        pager.search("pad");

        assert_eq!(pager.did_select_item(0).unwrap().id, 2);
        assert!(pager.did_select_item(1).is_none());
        assert!(pager.did_select_item(usize::MAX).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tile_subtitle_formats_category_and_price() {
        let catalog = Arc::new(StaticCatalog::new(vec![ProductRecord {
            price_cents: 1099,
            ..product(1, "Coffee Mug", "Kitchen")
        }]));
        let pager = CatalogPager::with_config(catalog, no_debounce());

        pager.load(0, 20);
        settle(&pager).await;

        let state = pager.state();
        let tile = &state.items().unwrap()[0];
        assert_eq!(tile.title, "Coffee Mug");
        assert_eq!(tile.subtitle, "Kitchen • $10.99");
    }
}
