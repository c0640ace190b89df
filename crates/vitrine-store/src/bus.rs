//! # Legacy Event Bus
//!
//! Named, fire-and-forget notifications for decoupled observers that do not
//! hold a typed subscription handle (the cart-count badge being the
//! canonical example). Payloads are JSON values; nobody is told whether
//! anyone listened.
//!
//! This is deliberately separate from [`crate::publisher::Publisher`]: the
//! publisher is the typed, per-component subscription surface; the bus is
//! the process-wide "something happened" channel kept for observers wired
//! up by name only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use serde_json::Value;
use tracing::debug;

type BusCallback = Arc<dyn Fn(&Value) + Send + Sync + 'static>;

#[derive(Default)]
struct BusInner {
    channels: Mutex<HashMap<String, Vec<(u64, BusCallback)>>>,
    next_id: AtomicU64,
}

/// Named-event broadcast bus.
#[derive(Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Creates an isolated bus (tests, embedded setups).
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide bus instance.
    pub fn global() -> Arc<EventBus> {
        static GLOBAL: OnceLock<Arc<EventBus>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(EventBus::new())))
    }

    /// Posts `payload` to every observer of `name`. Fire-and-forget: no
    /// observers means the payload vanishes.
    pub fn post(&self, name: &str, payload: Value) {
        let callbacks: Vec<BusCallback> = {
            let channels = self
                .inner
                .channels
                .lock()
                .expect("bus channel map mutex poisoned");
            match channels.get(name) {
                Some(observers) => observers.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
                None => {
                    debug!(event = name, "bus post with no observers");
                    return;
                }
            }
        };
        for cb in callbacks {
            cb(&payload);
        }
    }

    /// Registers an observer for `name`. Dropping the returned token
    /// unregisters it; safe to do from inside an observer callback.
    pub fn observe(
        &self,
        name: &str,
        callback: impl Fn(&Value) + Send + Sync + 'static,
    ) -> BusSubscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .channels
            .lock()
            .expect("bus channel map mutex poisoned")
            .entry(name.to_string())
            .or_default()
            .push((id, Arc::new(callback)));

        let weak = Arc::downgrade(&self.inner);
        let name = name.to_string();
        BusSubscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let mut channels = inner
                        .channels
                        .lock()
                        .expect("bus channel map mutex poisoned");
                    if let Some(observers) = channels.get_mut(&name) {
                        observers.retain(|(sid, _)| *sid != id);
                    }
                }
            })),
        }
    }
}

/// Unregister token returned by [`EventBus::observe`]. Unregisters on drop.
pub struct BusSubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl BusSubscription {
    /// Explicitly unregisters the observer.
    pub fn cancel(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(f) = self.cancel.take() {
            f();
        }
    }
}

impl Drop for BusSubscription {
    fn drop(&mut self) {
        self.run();
    }
}
