//! # vitrine-store: Stateful Stores for Vitrine
//!
//! Persisted, observable client state: the cart, the favorite-id set, and
//! the broadcast plumbing that pushes their transitions to subscribers.
//!
//! ## Modules
//!
//! - [`blob`] - Durable blob store collaborator (opaque get/set of bytes)
//! - [`cart`] - The cart store: linearized mutations, persist + broadcast
//! - [`favorites`] - Persisted favorite-id set
//! - [`publisher`] - Typed latest-value broadcast point
//! - [`bus`] - Legacy named fire-and-forget notifications
//! - [`error`] - Persistence error types
//!
//! ## Thread Safety
//! Every store serializes its own mutations behind a single lock; readers
//! receive immutable copies and never contend with writers beyond that
//! lock. Persistence failures are swallowed by design: the in-memory
//! snapshot remains authoritative (see `cart` module docs).

pub mod blob;
pub mod bus;
pub mod cart;
pub mod error;
pub mod favorites;
pub mod publisher;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use bus::{BusSubscription, EventBus};
pub use cart::{CartSnapshot, CartStore, CART_BLOB_KEY, CART_CHANGED_EVENT};
pub use error::{PersistError, PersistResult};
pub use favorites::{BlobFavoriteSet, FavoriteSet, FAVORITES_BLOB_KEY};
pub use publisher::{Publisher, Subscription};
