//! # vitrine-fetch: Catalog Fetch Orchestration for Vitrine
//!
//! Coordinates concurrent, cancellable, deduplicated catalog fetches and
//! publishes ordered view states through the store layer's broadcast
//! plumbing.
//!
//! ## Components
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Fetch Orchestrator                                 │
//! │                                                                         │
//! │  ┌──────────────────┐        ┌──────────────────────────────────────┐  │
//! │  │ FavoritesLoader  │        │ CatalogPager                         │  │
//! │  │                  │        │                                      │  │
//! │  │ id set ─► fan-out│        │ load(offset, limit) ─► page merge    │  │
//! │  │ bounded, ordered │        │ search(query)       ─► filter view   │  │
//! │  │ fan-in, publish  │        │ publish LoadState<ProductTile>       │  │
//! │  └────────┬─────────┘        └──────────────┬───────────────────────┘  │
//! │           │                                 │                           │
//! │           └──────────────┬──────────────────┘                           │
//! │                          ▼                                              │
//! │                 ┌────────────────┐                                      │
//! │                 │ CatalogClient  │  async trait: fetch_by_id,           │
//! │                 │ (collaborator) │  fetch_page                          │
//! │                 └────────────────┘                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both loaders share the same dispatch discipline: reentrancy guard,
//! debounce-as-hard-drop, and generation-token supersession that makes
//! results of a cancelled batch unobservable.

pub mod client;
pub mod error;
pub mod favorites;
pub mod pager;

pub use client::{CatalogClient, StaticCatalog};
pub use error::{FetchError, FetchResult};
pub use favorites::{EntryStatus, FavoriteEntry, FavoritesConfig, FavoritesLoader};
pub use pager::{CatalogPager, PagerConfig, PaginationState, ProductTile};
