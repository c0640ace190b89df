//! # Cart Mutation Logic
//!
//! Pure cart state and the full mutation set. The stateful, persisted,
//! observable wrapper lives in `vitrine-store`; everything here is
//! synchronous, allocation-cheap, and trivially testable.
//!
//! ## Invariants (hold after every mutation)
//! - Line ids are unique within the cart
//! - Lines are sorted ascending by `title`, stable on equal titles
//! - Every stored line has `quantity >= 1` (zero means removal)

use crate::types::CartLineItem;

/// The shopping cart: an ordered set of line items.
///
/// Mutation methods that can be no-ops (`set_quantity`, `change_quantity`
/// on an absent id) report whether anything changed, so callers can skip
/// persistence and broadcast for dropped mutations.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Rebuilds a cart from persisted lines, re-establishing the invariants:
    /// non-positive quantities are dropped, duplicate ids keep their first
    /// occurrence, and the result is re-sorted by title.
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let mut cart = Cart::new();
        for item in items {
            if item.quantity >= 1 && cart.item(&item.id).is_none() {
                cart.items.push(item);
            }
        }
        cart.sort();
        cart
    }

    /// Current lines, sorted by title.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Immutable point-in-time copy of the lines.
    pub fn snapshot(&self) -> Vec<CartLineItem> {
        self.items.clone()
    }

    /// Replaces or merges a line.
    ///
    /// With `merge_quantity` set and an existing line for `item.id`, the
    /// existing line is kept and its quantity becomes
    /// `max(0, existing + item.quantity)`. Otherwise the incoming line
    /// replaces (or inserts) wholesale. Either way a resulting quantity
    /// of zero or less removes the line.
    pub fn upsert(&mut self, item: CartLineItem, merge_quantity: bool) {
        if let Some(idx) = self.index_of(&item.id) {
            if merge_quantity {
                let merged = (self.items[idx].quantity + item.quantity).max(0);
                self.items[idx].quantity = merged;
            } else {
                self.items[idx] = item;
            }
            if self.items[idx].quantity <= 0 {
                self.items.remove(idx);
            }
        } else if item.quantity >= 1 {
            self.items.push(item);
        }
        self.sort();
    }

    /// Sets an exact quantity for `id`. `quantity <= 0` removes the line.
    ///
    /// Returns `false` (no change) when `id` is not in the cart.
    pub fn set_quantity(&mut self, id: &str, quantity: i64) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        if quantity <= 0 {
            self.items.remove(idx);
        } else {
            self.items[idx].quantity = quantity;
        }
        true
    }

    /// Adjusts the quantity of `id` by `delta`, clamped into `[min, max]`.
    /// A clamped result of zero or less removes the line.
    ///
    /// Returns `false` (no change) when `id` is not in the cart.
    pub fn change_quantity(&mut self, id: &str, delta: i64, min: i64, max: i64) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        // Not `i64::clamp`: an inverted min/max pair must not panic here,
        // it resolves to min.
        let qty = (self.items[idx].quantity + delta).min(max).max(min);
        if qty <= 0 {
            self.items.remove(idx);
        } else {
            self.items[idx].quantity = qty;
        }
        true
    }

    /// Removes the line with `id`, if present.
    pub fn remove(&mut self, id: &str) {
        self.items.retain(|item| item.id != id);
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Point lookup by id.
    pub fn item(&self, id: &str) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Subtotal in cents across all lines.
    pub fn subtotal_cents(&self) -> i64 {
        self.items.iter().map(|item| item.line_total_cents()).sum()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn sort(&mut self) {
        // Vec::sort_by is stable: equal titles keep their insertion order.
        self.items.sort_by(|a, b| a.title.cmp(&b.title));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, title: &str, price_cents: i64, quantity: i64) -> CartLineItem {
        CartLineItem {
            id: id.to_string(),
            title: title.to_string(),
            unit_price_cents: price_cents,
            image_ref: None,
            quantity,
        }
    }

    #[test]
    fn test_upsert_inserts_sorted_by_title() {
        let mut cart = Cart::new();
        cart.upsert(line("1", "Zebra mug", 500, 1), false);
        cart.upsert(line("2", "Apple stand", 900, 1), false);
        cart.upsert(line("3", "Mouse pad", 300, 1), false);

        let titles: Vec<&str> = cart.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Apple stand", "Mouse pad", "Zebra mug"]);
    }

    #[test]
    fn test_upsert_merge_adds_quantities() {
        let mut cart = Cart::new();
        cart.upsert(line("1", "Mug", 500, 2), false);
        cart.upsert(line("1", "Mug", 500, 3), true);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item("1").unwrap().quantity, 5);
    }

    #[test]
    fn test_upsert_merge_never_goes_negative() {
        let mut cart = Cart::new();
        cart.upsert(line("1", "Mug", 500, 2), false);
        cart.upsert(line("1", "Mug", 500, -10), true);

        // max(0, 2 - 10) == 0, and zero is removal
        assert!(cart.item("1").is_none());
    }

    #[test]
    fn test_upsert_replace_overwrites_wholesale() {
        let mut cart = Cart::new();
        cart.upsert(line("1", "Mug", 500, 2), false);
        cart.upsert(line("1", "Mug (blue)", 700, 1), false);

        let item = cart.item("1").unwrap();
        assert_eq!(item.title, "Mug (blue)");
        assert_eq!(item.unit_price_cents, 700);
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.upsert(line("1", "Mug", 500, 2), false);

        assert!(cart.set_quantity("1", 0));
        assert!(cart.item("1").is_none());
    }

    #[test]
    fn test_set_quantity_absent_id_is_noop() {
        let mut cart = Cart::new();
        cart.upsert(line("1", "Mug", 500, 2), false);

        assert!(!cart.set_quantity("nope", 5));
        assert_eq!(cart.item("1").unwrap().quantity, 2);
    }

    #[test]
    fn test_change_quantity_clamps_to_bounds() {
        let mut cart = Cart::new();
        cart.upsert(line("1", "Mug", 500, 5), false);

        cart.change_quantity("1", 100, 0, 10);
        assert_eq!(cart.item("1").unwrap().quantity, 10);

        cart.change_quantity("1", -4, 8, 10);
        assert_eq!(cart.item("1").unwrap().quantity, 8);
    }

    #[test]
    fn test_change_quantity_to_zero_removes() {
        let mut cart = Cart::new();
        cart.upsert(line("1", "Mug", 500, 1), false);

        cart.change_quantity("1", -1, 0, i64::MAX);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_change_quantity_absent_id_is_noop() {
        let mut cart = Cart::new();
        assert!(!cart.change_quantity("ghost", 1, 0, i64::MAX));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.upsert(line("1", "Mug", 500, 2), false);
        cart.upsert(line("2", "Pad", 300, 3), false);

        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.subtotal_cents(), 2 * 500 + 3 * 300);
    }

    #[test]
    fn test_from_items_reestablishes_invariants() {
        let cart = Cart::from_items(vec![
            line("1", "Zebra", 500, 2),
            line("2", "Apple", 300, 0),  // dropped: zero quantity
            line("1", "Zebra", 500, 9),  // dropped: duplicate id
            line("3", "Apple", 300, 1),
        ]);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].id, "3"); // "Apple" sorts before "Zebra"
        assert_eq!(cart.item("1").unwrap().quantity, 2);
    }

    #[test]
    fn test_equal_titles_keep_insertion_order() {
        let mut cart = Cart::new();
        cart.upsert(line("a", "Mug", 500, 1), false);
        cart.upsert(line("b", "Mug", 600, 1), false);
        cart.upsert(line("c", "Mug", 700, 1), false);

        let ids: Vec<&str> = cart.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
