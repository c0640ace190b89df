//! # vitrine-core: Pure Domain Logic for Vitrine
//!
//! This crate is the **heart** of Vitrine's state layer. It contains all
//! domain logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vitrine Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 UI-facing callers (out of scope)                │   │
//! │  │    cart screen ──► favorites screen ──► product list           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ intents                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        vitrine-store / vitrine-fetch (stateful layers)          │   │
//! │  │    CartStore, FavoritesLoader, CatalogPager, Publisher          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vitrine-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐    ┌───────────┐    ┌───────────┐              │   │
//! │  │   │   types   │    │   cart    │    │   state   │              │   │
//! │  │   │ Product   │    │   Cart    │    │ LoadState │              │   │
//! │  │   │ CartLine  │    │ mutations │    │  machine  │              │   │
//! │  │   └───────────┘    └───────────┘    └───────────┘              │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO ASYNC • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (ProductRecord, CartLineItem) and price display
//! - [`cart`] - Cart mutation logic with the sorted/unique/positive invariants
//! - [`state`] - The LoadState tagged union published by loaders
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Persistence and network access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors

pub mod cart;
pub mod state;
pub mod types;

// Re-exports for convenience: `use vitrine_core::Cart` instead of
// `use vitrine_core::cart::Cart`
pub use cart::Cart;
pub use state::LoadState;
pub use types::{format_price_cents, CartLineItem, ProductRecord};
