//! # Favorites Loader
//!
//! Turns the favorite-id set into an ordered list of resolved entries
//! under concurrency, cancellation, dedup, and rate limiting - without
//! ever leaking a stale result into the current view.
//!
//! ## Dispatch Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     FavoritesLoader::load()                             │
//! │                                                                         │
//! │  load() ──► in-flight guard ──► debounce guard ──► bump generation      │
//! │                (no-op)            (hard drop)      (supersede batch)    │
//! │                                                        │                │
//! │                      snapshot id order  ◄──────────────┘                │
//! │                             │                                           │
//! │              empty ─────────┼──────────► publish Empty, done            │
//! │                             ▼                                           │
//! │              publish Loaded(pending placeholders)                       │
//! │                             │                                           │
//! │          ┌──────────────────┼──────────────────┐                        │
//! │          ▼                  ▼                  ▼     (semaphore-bounded)│
//! │     fetch id[0]        fetch id[1]        fetch id[n]                   │
//! │          │                  │                  │                        │
//! │          └───────► mpsc fan-in (unordered) ◄───┘                        │
//! │                             │                                           │
//! │              walk snapshot order: hit ─► ready entry                    │
//! │                                  miss ─► failed placeholder             │
//! │                             │                                           │
//! │              generation still current? ── no ─► discard silently        │
//! │                             │ yes                                       │
//! │              publish Loaded(final), clear in-flight flag                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every fetch task checks the generation before starting work and before
//! contributing its result, so a superseded or cancelled batch cannot
//! publish anything - the previously visible state stays untouched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;
use tracing::{debug, warn};

use vitrine_core::{LoadState, ProductRecord};
use vitrine_store::favorites::FavoriteSet;
use vitrine_store::publisher::{Publisher, Subscription};

use crate::client::CatalogClient;

// =============================================================================
// Configuration
// =============================================================================

/// Minimum interval between two accepted `load` dispatches.
pub const DEFAULT_FAVORITES_DEBOUNCE: Duration = Duration::from_secs(1);

/// Default cap on concurrently outstanding per-id fetches.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Tuning knobs for [`FavoritesLoader`].
#[derive(Debug, Clone)]
pub struct FavoritesConfig {
    /// Debounce window; a `load` inside it is dropped, not queued.
    pub debounce: Duration,

    /// Fan-out concurrency cap. Large favorite sets still resolve fully,
    /// at most this many fetches run at once.
    pub max_concurrency: usize,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        FavoritesConfig {
            debounce: DEFAULT_FAVORITES_DEBOUNCE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

// =============================================================================
// Published Entry
// =============================================================================

/// Resolution status of one favorites row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryStatus {
    /// Placeholder while the fetch is outstanding.
    Pending,
    /// Resolved from the catalog.
    Ready,
    /// The fetch failed; the row stays visible as a failure placeholder.
    Failed,
}

/// One row of the favorites view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: EntryStatus,
}

impl FavoriteEntry {
    fn pending(id: i64) -> Self {
        FavoriteEntry {
            id,
            title: "Loading...".to_string(),
            description: String::new(),
            status: EntryStatus::Pending,
        }
    }

    fn failed(id: i64) -> Self {
        FavoriteEntry {
            id,
            title: "Failed to load".to_string(),
            description: format!("Product #{id}"),
            status: EntryStatus::Failed,
        }
    }

    fn ready(product: &ProductRecord) -> Self {
        FavoriteEntry {
            id: product.id,
            title: product.name.clone(),
            description: product.description.clone(),
            status: EntryStatus::Ready,
        }
    }
}

// =============================================================================
// Favorites Loader
// =============================================================================

struct DispatchGuard {
    /// A batch is between dispatch and fan-in completion.
    in_flight: bool,

    /// When the last non-empty batch was dispatched.
    last_dispatch: Option<Instant>,
}

/// Concurrent, cancellable, debounced favorites loader.
///
/// The published order is fixed when a batch is dispatched: it is the
/// favorite-set iteration order at that moment, independent of which fetch
/// completes first.
pub struct FavoritesLoader {
    client: Arc<dyn CatalogClient>,
    favorites: Arc<dyn FavoriteSet>,
    publisher: Publisher<LoadState<FavoriteEntry>>,
    semaphore: Arc<Semaphore>,

    /// Current batch generation. Bumping it invalidates every task spawned
    /// under an older generation.
    generation: AtomicU64,
    guard: Mutex<DispatchGuard>,
    config: FavoritesConfig,
}

impl FavoritesLoader {
    /// Creates a loader with default configuration, starting `Idle`.
    pub fn new(client: Arc<dyn CatalogClient>, favorites: Arc<dyn FavoriteSet>) -> Arc<Self> {
        Self::with_config(client, favorites, FavoritesConfig::default())
    }

    /// Creates a loader with explicit configuration.
    pub fn with_config(
        client: Arc<dyn CatalogClient>,
        favorites: Arc<dyn FavoriteSet>,
        config: FavoritesConfig,
    ) -> Arc<Self> {
        Arc::new(FavoritesLoader {
            client,
            favorites,
            publisher: Publisher::new(LoadState::Idle),
            semaphore: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            generation: AtomicU64::new(0),
            guard: Mutex::new(DispatchGuard {
                in_flight: false,
                last_dispatch: None,
            }),
            config,
        })
    }

    /// Current published state.
    pub fn state(&self) -> LoadState<FavoriteEntry> {
        self.publisher.latest()
    }

    /// True while a batch is between dispatch and fan-in completion.
    pub fn is_loading(&self) -> bool {
        self.guard().in_flight
    }

    /// Subscribes to state transitions (current state delivered
    /// immediately).
    pub fn subscribe(
        &self,
        callback: impl Fn(&LoadState<FavoriteEntry>) + Send + Sync + 'static,
    ) -> Subscription {
        self.publisher.subscribe(callback)
    }

    /// Watch-channel view of the state stream for async consumers.
    pub fn watch(&self) -> tokio::sync::watch::Receiver<LoadState<FavoriteEntry>> {
        self.publisher.watch()
    }

    /// Dispatches a load of the current favorite set.
    ///
    /// No-op while a batch is in flight or inside the debounce window.
    /// Otherwise: supersedes any straggling previous batch, snapshots the
    /// id order, immediately publishes pending placeholders, and fans out
    /// one fetch per id (concurrency-capped).
    pub fn load(self: &Arc<Self>) {
        let (generation, ids) = {
            let mut guard = self.guard();
            if guard.in_flight {
                debug!("favorites load ignored: batch already in flight");
                return;
            }
            if let Some(last) = guard.last_dispatch {
                if last.elapsed() < self.config.debounce {
                    debug!("favorites load dropped: inside debounce window");
                    return;
                }
            }

            // Invalidate whatever a previously cancelled batch may still
            // be resolving.
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

            let ids = self.favorites.all();
            if ids.is_empty() {
                self.publisher.publish(LoadState::Empty);
                return;
            }

            guard.in_flight = true;
            guard.last_dispatch = Some(Instant::now());

            // Skeletons first: consumers render one row per id without
            // waiting on the network.
            let placeholders = ids.iter().map(|&id| FavoriteEntry::pending(id)).collect();
            self.publisher.publish(LoadState::Loaded(placeholders));

            (generation, ids)
        };

        debug!(count = ids.len(), generation, "favorites batch dispatched");
        let loader = Arc::clone(self);
        tokio::spawn(async move { loader.run_batch(generation, ids).await });
    }

    /// Re-dispatches a load; same guards as [`FavoritesLoader::load`].
    pub fn refresh(self: &Arc<Self>) {
        self.load();
    }

    /// Abandons the in-flight batch, if any. The previously published
    /// state stays visible; nothing from the abandoned batch will ever be
    /// published.
    pub fn cancel(&self) {
        let mut guard = self.guard();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if guard.in_flight {
            guard.in_flight = false;
            debug!("favorites batch cancelled");
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn guard(&self) -> std::sync::MutexGuard<'_, DispatchGuard> {
        self.guard.lock().expect("dispatch guard mutex poisoned")
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Fans out one fetch task per id, collects unordered results, and
    /// publishes the final list in the dispatch-time id order.
    async fn run_batch(self: Arc<Self>, generation: u64, ids: Vec<i64>) {
        let (tx, mut rx) = mpsc::channel(ids.len());

        for &id in &ids {
            let loader = Arc::clone(&self);
            let tx = tx.clone();
            tokio::spawn(async move {
                let Ok(_permit) = loader.semaphore.clone().acquire_owned().await else {
                    return;
                };
                // Cancelled while queued: do not start meaningful work.
                if !loader.is_current(generation) {
                    return;
                }
                let result = loader.client.fetch_by_id(id).await;
                // Cancelled while fetching: contribute nothing.
                if !loader.is_current(generation) {
                    return;
                }
                let _ = tx.send((id, result)).await;
            });
        }
        drop(tx);

        // Unordered fan-in. The published view is not touched until the
        // whole batch is accounted for.
        let mut resolved: HashMap<i64, crate::error::FetchResult<ProductRecord>> = HashMap::new();
        while let Some((id, result)) = rx.recv().await {
            if !self.is_current(generation) {
                break;
            }
            resolved.insert(id, result);
        }

        let mut guard = self.guard();
        if !self.is_current(generation) {
            // Superseded or cancelled: whoever owns the current generation
            // also owns the in-flight flag and the published state.
            debug!(generation, "favorites batch discarded");
            return;
        }

        let entries: Vec<FavoriteEntry> = ids
            .iter()
            .map(|id| match resolved.remove(id) {
                Some(Ok(product)) => FavoriteEntry::ready(&product),
                Some(Err(e)) => {
                    warn!(id, error = %e, "favorite fetch failed");
                    FavoriteEntry::failed(*id)
                }
                // A task that died without reporting still gets its row.
                None => FavoriteEntry::failed(*id),
            })
            .collect();

        debug!(generation, count = entries.len(), "favorites batch complete");
        self.publisher.publish(LoadState::Loaded(entries));
        guard.in_flight = false;
    }
}
