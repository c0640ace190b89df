//! # Cart Store
//!
//! The persisted, observable cart. All mutations are linearized behind a
//! single lock so concurrent callers observe a consistent, monotonically
//! replaced snapshot; every accepted mutation persists and broadcasts the
//! new snapshot before the call returns.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Mutation Flow                             │
//! │                                                                         │
//! │  caller ──► lock ──► pure cart op ──► snapshot ──┐                      │
//! │                      (vitrine-core)              │                      │
//! │                                                  ▼                      │
//! │             1. persist to BlobStore     (best effort, failure logged)   │
//! │             2. Publisher.publish        (typed subscribers)             │
//! │             3. EventBus.post            (legacy "cart://changed")       │
//! │                                                  │                      │
//! │  caller ◄── unlock ◄─────────────────────────────┘                      │
//! │                                                                         │
//! │  NOTE: steps 1-3 run inside the lock. The Nth publish is exactly        │
//! │        the effect of the Nth accepted mutation, never interleaved.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persistence Failures
//! Writes are best-effort by contract: a failed write is logged and
//! swallowed, the in-memory snapshot stays authoritative, and the caller is
//! never informed. Changing this would change user-visible semantics.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use vitrine_core::{Cart, CartLineItem};

use crate::blob::BlobStore;
use crate::bus::EventBus;
use crate::publisher::{Publisher, Subscription};

/// Blob key the cart is persisted under.
pub const CART_BLOB_KEY: &str = "cart_v1";

/// Bus event name posted after every cart change.
pub const CART_CHANGED_EVENT: &str = "cart://changed";

/// Immutable point-in-time copy of the cart lines, sorted by title.
pub type CartSnapshot = Vec<CartLineItem>;

/// Persisted envelope around the cart lines.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCart {
    items: Vec<CartLineItem>,
    saved_at: DateTime<Utc>,
}

/// Thread-safe, persisted, observable cart.
pub struct CartStore {
    cart: Mutex<Cart>,
    blob: Arc<dyn BlobStore>,
    publisher: Publisher<CartSnapshot>,
    bus: Arc<EventBus>,
}

impl CartStore {
    /// Opens the store against `blob`, hydrating from [`CART_BLOB_KEY`].
    /// Absent or undecodable blobs start an empty cart. Bus notices go to
    /// the process-wide [`EventBus::global`].
    pub fn open(blob: Arc<dyn BlobStore>) -> Self {
        Self::with_bus(blob, EventBus::global())
    }

    /// Same as [`CartStore::open`] with an explicit bus instance.
    pub fn with_bus(blob: Arc<dyn BlobStore>, bus: Arc<EventBus>) -> Self {
        let cart = match blob.get(CART_BLOB_KEY) {
            Some(bytes) => match serde_json::from_slice::<StoredCart>(&bytes) {
                Ok(stored) => {
                    debug!(lines = stored.items.len(), "cart hydrated from blob");
                    Cart::from_items(stored.items)
                }
                Err(e) => {
                    warn!(error = %e, "stored cart undecodable, starting empty");
                    Cart::new()
                }
            },
            None => Cart::new(),
        };

        let publisher = Publisher::new(cart.snapshot());
        CartStore {
            cart: Mutex::new(cart),
            blob,
            publisher,
            bus,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current snapshot (cheap copy, no mutation lock contention beyond the
    /// copy itself).
    pub fn snapshot(&self) -> CartSnapshot {
        self.publisher.latest()
    }

    /// Point lookup against the current snapshot.
    pub fn item(&self, id: &str) -> Option<CartLineItem> {
        self.lock().item(id).cloned()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lock().total_quantity()
    }

    /// Subtotal in cents across all lines.
    pub fn subtotal_cents(&self) -> i64 {
        self.lock().subtotal_cents()
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Subscribes to snapshot changes; delivers the current snapshot
    /// immediately. Callbacks run inside the mutation path - see
    /// [`Publisher`] for the rules, and use [`CartStore::watch`] for
    /// consumers that need their own context.
    pub fn subscribe(
        &self,
        callback: impl Fn(&CartSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        self.publisher.subscribe(callback)
    }

    /// Watch-channel view of the snapshot stream for async consumers.
    pub fn watch(&self) -> tokio::sync::watch::Receiver<CartSnapshot> {
        self.publisher.watch()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Replaces or merges a line (see [`Cart::upsert`]). Returns the
    /// post-mutation snapshot.
    pub fn upsert(&self, item: CartLineItem, merge_quantity: bool) -> CartSnapshot {
        let mut cart = self.lock();
        cart.upsert(item, merge_quantity);
        self.commit(&cart)
    }

    /// Sets an exact quantity (`<= 0` removes). An absent id is a dropped
    /// no-op: nothing persisted, nothing published.
    pub fn set_quantity(&self, id: &str, quantity: i64) -> CartSnapshot {
        let mut cart = self.lock();
        if cart.set_quantity(id, quantity) {
            self.commit(&cart)
        } else {
            cart.snapshot()
        }
    }

    /// Adjusts a quantity by `delta` clamped into `[min, max]`; a clamped
    /// result `<= 0` removes the line. An absent id is a dropped no-op.
    pub fn change_quantity(&self, id: &str, delta: i64, min: i64, max: i64) -> CartSnapshot {
        let mut cart = self.lock();
        if cart.change_quantity(id, delta, min, max) {
            self.commit(&cart)
        } else {
            cart.snapshot()
        }
    }

    /// Removes a line by id.
    pub fn remove(&self, id: &str) -> CartSnapshot {
        let mut cart = self.lock();
        cart.remove(id);
        self.commit(&cart)
    }

    /// Removes every line.
    pub fn clear(&self) -> CartSnapshot {
        let mut cart = self.lock();
        cart.clear();
        self.commit(&cart)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock(&self) -> std::sync::MutexGuard<'_, Cart> {
        self.cart.lock().expect("cart mutex poisoned")
    }

    /// Persist + broadcast, in that order, while the cart lock is held.
    fn commit(&self, cart: &Cart) -> CartSnapshot {
        let snapshot = cart.snapshot();

        let stored = StoredCart {
            items: snapshot.clone(),
            saved_at: Utc::now(),
        };
        match serde_json::to_vec(&stored) {
            Ok(bytes) => {
                if let Err(e) = self.blob.set(CART_BLOB_KEY, &bytes) {
                    warn!(error = %e, "cart persistence failed, in-memory snapshot stays authoritative");
                }
            }
            Err(e) => warn!(error = %e, "cart snapshot failed to encode"),
        }

        self.publisher.publish(snapshot.clone());
        self.bus
            .post(CART_CHANGED_EVENT, json!({ "items": &snapshot }));

        snapshot
    }
}
