//! # Domain Types
//!
//! Core domain types shared by the store and fetch layers.
//!
//! ## Identity
//! - `ProductRecord.id`: integer id assigned by the remote catalog
//! - `CartLineItem.id`: string key, unique within a cart snapshot (the
//!   catalog id rendered as a string when a product is added to the cart)
//!
//! ## Integer Money
//! All monetary values are integer cents (i64). Floats never touch prices;
//! [`format_price_cents`] is the one place cents become display text.

use serde::{Deserialize, Serialize};
use url::Url;

// =============================================================================
// Product Record
// =============================================================================

/// A catalog product as resolved from the remote catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Catalog identifier.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Category name (flattened from the catalog's nested category).
    pub category: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Primary image, if the catalog provided one.
    pub image_ref: Option<Url>,

    /// Units in stock.
    pub stock_count: i64,

    /// Average rating (display only, never used in money math).
    pub rating: f64,

    /// Long-form description.
    pub description: String,
}

// =============================================================================
// Cart Line Item
// =============================================================================

/// A line in the shopping cart.
///
/// ## Price Freezing
/// The price is captured when the product is added. If the catalog price
/// changes later, this line retains the price the shopper saw.
///
/// ## Invariant
/// A stored line always has `quantity >= 1`; a mutation that would leave a
/// line at zero (or below) removes it instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Identity key, unique within a snapshot.
    pub id: String,

    /// Product title at time of adding (frozen).
    pub title: String,

    /// Price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Product image at time of adding (frozen).
    pub image_ref: Option<Url>,

    /// Quantity in cart.
    pub quantity: i64,
}

impl CartLineItem {
    /// Creates a cart line from a catalog product, freezing name, price,
    /// and image at this moment.
    pub fn from_record(product: &ProductRecord, quantity: i64) -> Self {
        CartLineItem {
            id: product.id.to_string(),
            title: product.name.clone(),
            unit_price_cents: product.price_cents,
            image_ref: product.image_ref.clone(),
            quantity,
        }
    }

    /// Line total (unit price × quantity).
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

// =============================================================================
// Price Display
// =============================================================================

/// Formats integer cents as a display price, e.g. `1099` → `"$10.99"`.
///
/// Negative values keep the sign ahead of the currency symbol (`"-$0.50"`).
pub fn format_price_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}
