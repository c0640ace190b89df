//! # Reactive View Publisher
//!
//! One broadcast point per owning store or loader. Semantics:
//!
//! - **Latest value on subscribe**: a new subscriber is invoked immediately
//!   with the current value.
//! - **Synchronous fan-out**: `publish` invokes every subscriber before
//!   returning to the broadcaster.
//! - **Re-entrancy safe**: no internal lock is held while callbacks run, so
//!   a callback may subscribe, unsubscribe (including itself), or publish
//!   without deadlocking.
//! - **Async redirection**: [`Publisher::watch`] hands out a
//!   `tokio::sync::watch::Receiver` so consumers that must run on their own
//!   context (a render loop, a UI task) can pick up transitions without
//!   ever blocking the producer.
//!
//! Callbacks run on the publishing thread, usually while the owning store's
//! state lock is held. They must return promptly and must not call back
//! into the owning store's mutating operations - consumers that need to do
//! either should go through `watch()` instead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

struct Shared<T> {
    /// Latest published value, doubling as the async bridge.
    latest: watch::Sender<T>,

    /// Registered synchronous subscribers.
    subscribers: Mutex<Vec<(u64, Callback<T>)>>,

    /// Next subscription id.
    next_id: AtomicU64,
}

/// Latest-value broadcast point for one owning component.
pub struct Publisher<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + Sync + 'static> Publisher<T> {
    /// Creates a publisher holding `initial` as its current value.
    pub fn new(initial: T) -> Self {
        let (latest, _) = watch::channel(initial);
        Publisher {
            shared: Arc::new(Shared {
                latest,
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the current value.
    pub fn latest(&self) -> T {
        self.shared.latest.borrow().clone()
    }

    /// Publishes `value`: updates the current value, then synchronously
    /// invokes every subscriber registered at this moment.
    pub fn publish(&self, value: T) {
        let callbacks: Vec<Callback<T>> = {
            let subs = self
                .shared
                .subscribers
                .lock()
                .expect("subscriber list mutex poisoned");
            subs.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };

        // Watch first, callbacks second: a callback reading latest() must
        // already observe the value it is being invoked with.
        self.shared.latest.send_replace(value.clone());

        for cb in callbacks {
            cb(&value);
        }
    }

    /// Registers `callback` and immediately invokes it with the current
    /// value. Dropping (or `cancel`ing) the returned token unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let cb: Callback<T> = Arc::new(callback);

        self.shared
            .subscribers
            .lock()
            .expect("subscriber list mutex poisoned")
            .push((id, Arc::clone(&cb)));

        let latest = self.shared.latest.borrow().clone();
        cb(&latest);

        let weak = Arc::downgrade(&self.shared);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared
                        .subscribers
                        .lock()
                        .expect("subscriber list mutex poisoned")
                        .retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    /// Hands out a watch receiver seeded with the current value. Receivers
    /// observe every `publish` as a change notification; a slow receiver
    /// only ever skips to the newest value, never blocks the producer.
    pub fn watch(&self) -> watch::Receiver<T> {
        self.shared.latest.subscribe()
    }

    /// Number of registered synchronous subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared
            .subscribers
            .lock()
            .expect("subscriber list mutex poisoned")
            .len()
    }
}

/// Unsubscribe token returned by [`Publisher::subscribe`].
///
/// Unsubscribes on drop; `cancel` does the same thing explicitly. Safe to
/// drop from inside a subscriber callback.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Explicitly unsubscribes.
    pub fn cancel(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(f) = self.cancel.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}
