//! Shopping cart container.
//!
//! [`Cart`] is the single source of truth for the customer's cart. It is
//! created once by the application root ([`crate::state::AppState`]) and
//! handed to whoever needs it; there is no global instance.
//!
//! # Invariants
//!
//! - No two lines share a [`LineKey`] (product, colour, size)
//! - Every line has `quantity >= 1`
//! - Totals are recomputed from the lines on every read
//!
//! # Persistence
//!
//! Every mutation writes the full cart to the [`KeyValueStore`] under
//! [`keys::CART`] before returning; emptying the cart removes the entry. If that write fails the in-memory cart
//! stays authoritative for the rest of the session; the failure is logged
//! and kept in [`Cart::last_persist_error`].
//!
//! # Example
//!
//! ```rust
//! use royshop_core::Price;
//! use royshop_storefront::cart::{AddItem, Cart, LineKey};
//! use royshop_storefront::storage::MemoryStore;
//!
//! let mut cart = Cart::load(MemoryStore::new());
//! let shirt = LineKey::new("p1", "Black", "M");
//!
//! cart.add_item(AddItem::new(shirt.clone(), "Shirt", Price::from_dinars(4500)));
//! cart.add_item(AddItem::new(shirt.clone(), "Shirt", Price::from_dinars(4500)).with_quantity(2));
//!
//! assert_eq!(cart.len(), 1);
//! assert_eq!(cart.total_price(), Price::from_dinars(13_500));
//! ```

pub mod envelope;
mod item;

use royshop_core::Price;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::storage::{KeyValueStore, StorageError, keys};

pub use item::{AddItem, CartLineItem, LineKey};

/// Failure to durably write the cart.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The envelope could not be serialized.
    #[error("failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The store rejected the write.
    #[error("failed to save cart: {0}")]
    Storage(#[from] StorageError),
}

/// The customer's cart, persisted to a [`KeyValueStore`] on every change.
#[derive(Debug)]
pub struct Cart<S: KeyValueStore> {
    items: Vec<CartLineItem>,
    store: S,
    last_persist_error: Option<PersistError>,
}

impl<S: KeyValueStore> Cart<S> {
    /// Load the cart from `store`, or start empty.
    ///
    /// A missing, unreadable or corrupt snapshot yields an empty cart; this
    /// never fails. Snapshots from older schema versions are migrated and
    /// written back in the current layout; snapshots from a newer version are
    /// read best-effort and left untouched in the store.
    #[must_use]
    pub fn load(store: S) -> Self {
        let mut cart = Self {
            items: Vec::new(),
            store,
            last_persist_error: None,
        };

        let raw = match cart.store.get(keys::CART) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No saved cart, starting empty");
                return cart;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read saved cart, starting empty");
                return cart;
            }
        };

        match envelope::decode(&raw) {
            Ok(decoded) => {
                let needs_rewrite = decoded.needs_rewrite();
                cart.items = decoded.items;
                info!(lines = cart.items.len(), "Restored saved cart");
                if needs_rewrite {
                    info!(
                        from_version = decoded.stored_version,
                        to_version = envelope::SCHEMA_VERSION,
                        "Migrated saved cart"
                    );
                    cart.persist();
                }
            }
            Err(e) => {
                warn!(error = %e, "Saved cart is unreadable, starting empty");
            }
        }

        cart
    }

    /// Add a product configuration, merging into an existing line with the
    /// same key.
    ///
    /// A merged line keeps its original name, price and image; only the
    /// quantity grows. Quantities below 1 count as 1.
    pub fn add_item(&mut self, request: AddItem) {
        let quantity = request.effective_quantity();

        if let Some(line) = self.line_mut(&request.key) {
            line.quantity = line.quantity.saturating_add(quantity);
            debug!(key = %request.key, quantity = line.quantity, "Merged cart line");
        } else {
            debug!(key = %request.key, quantity, "Added cart line");
            self.items.push(CartLineItem {
                key: request.key,
                display_id: Uuid::new_v4().to_string(),
                name: request.name,
                unit_price: request.unit_price,
                quantity,
                image: request.image,
            });
        }

        self.persist();
    }

    /// Remove the line with `key`. Does nothing if there is no such line.
    pub fn remove_item(&mut self, key: &LineKey) {
        let before = self.items.len();
        self.items.retain(|line| &line.key != key);

        if self.items.len() != before {
            debug!(key = %key, "Removed cart line");
            self.persist();
        }
    }

    /// Set the quantity of the line with `key`.
    ///
    /// A quantity of zero or less removes the line. A missing line is left
    /// missing; this never inserts.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: i64) {
        let Ok(quantity) = u32::try_from(quantity.max(0)) else {
            self.set_quantity(key, u32::MAX);
            return;
        };

        if quantity == 0 {
            self.remove_item(key);
        } else {
            self.set_quantity(key, quantity);
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        debug!("Cleared cart");
        self.persist();
    }

    /// Current lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// The line with `key`, if present.
    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&CartLineItem> {
        self.items.iter().find(|line| &line.key == key)
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The error from the most recent failed write, cleared by the next
    /// successful one.
    #[must_use]
    pub const fn last_persist_error(&self) -> Option<&PersistError> {
        self.last_persist_error.as_ref()
    }

    fn line_mut(&mut self, key: &LineKey) -> Option<&mut CartLineItem> {
        self.items.iter_mut().find(|line| &line.key == key)
    }

    fn set_quantity(&mut self, key: &LineKey, quantity: u32) {
        let Some(line) = self.line_mut(key) else {
            debug!(key = %key, "Quantity update for missing line ignored");
            return;
        };
        line.quantity = quantity;
        self.persist();
    }

    fn persist(&mut self) {
        // An empty cart is stored as no entry at all
        let result = if self.items.is_empty() {
            self.store.remove(keys::CART).map_err(PersistError::from)
        } else {
            envelope::encode(&self.items)
                .map_err(PersistError::from)
                .and_then(|raw| Ok(self.store.set(keys::CART, &raw)?))
        };

        match result {
            Ok(()) => self.last_persist_error = None,
            Err(e) => {
                warn!(
                    error = %e,
                    lines = self.items.len(),
                    "Cart not saved; keeping in-memory cart for this session"
                );
                self.last_persist_error = Some(e);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use crate::storage::MemoryStore;

    use super::*;

    fn shirt(size: &str) -> AddItem {
        AddItem::new(LineKey::new("p1", "Black", size), "Shirt", Price::from_dinars(4500))
            .with_image("/img/shirt.jpg")
    }

    fn jeans() -> AddItem {
        AddItem::new(LineKey::new("p2", "Blue", "L"), "Jeans", Price::from_dinars(2500))
    }

    fn empty_cart() -> Cart<Arc<MemoryStore>> {
        Cart::load(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_empty_cart_totals() {
        let cart = empty_cart();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Price::ZERO);
        assert_eq!(cart.total_item_count(), 0);
    }

    #[test]
    fn test_add_same_key_merges() {
        let mut cart = empty_cart();
        cart.add_item(shirt("M"));
        cart.add_item(shirt("M").with_quantity(2));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items().first().unwrap().quantity, 3);
        assert_eq!(cart.total_price(), Price::from_dinars(13_500));
    }

    #[test]
    fn test_merge_keeps_first_metadata() {
        let mut cart = empty_cart();
        cart.add_item(shirt("M"));
        let display_id = cart.items().first().unwrap().display_id.clone();

        let mut repriced = shirt("M");
        repriced.name = "Renamed".to_string();
        repriced.unit_price = Price::from_dinars(1);
        repriced.image = None;
        cart.add_item(repriced);

        let line = cart.items().first().unwrap();
        assert_eq!(line.name, "Shirt");
        assert_eq!(line.unit_price, Price::from_dinars(4500));
        assert_eq!(line.image.as_deref(), Some("/img/shirt.jpg"));
        assert_eq!(line.display_id, display_id);
    }

    #[test]
    fn test_add_non_positive_quantity_counts_as_one() {
        let mut cart = empty_cart();
        cart.add_item(shirt("M").with_quantity(0));
        cart.add_item(shirt("M").with_quantity(-4));

        assert_eq!(cart.total_item_count(), 2);
    }

    #[test]
    fn test_different_sizes_are_distinct_lines() {
        let mut cart = empty_cart();
        cart.add_item(shirt("M"));
        cart.add_item(shirt("L"));

        assert_eq!(cart.len(), 2);
        assert_ne!(
            cart.items().first().unwrap().display_id,
            cart.items().get(1).unwrap().display_id
        );
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut cart = empty_cart();
        cart.add_item(shirt("M"));
        cart.add_item(jeans());

        cart.update_quantity(&LineKey::new("p1", "Black", "M"), 0);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_item_count(), 1);
        assert_eq!(cart.total_price(), Price::from_dinars(2500));
    }

    #[test]
    fn test_update_sets_exact_quantity() {
        let mut cart = empty_cart();
        cart.add_item(jeans());
        let key = LineKey::new("p2", "Blue", "L");

        cart.update_quantity(&key, 5);
        assert_eq!(cart.get(&key).unwrap().quantity, 5);

        cart.update_quantity(&key, -1);
        assert!(cart.get(&key).is_none());
    }

    #[test]
    fn test_update_missing_never_inserts() {
        let mut cart = empty_cart();
        cart.update_quantity(&LineKey::new("p9", "Red", "S"), 3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_missing_keeps_order() {
        let mut cart = empty_cart();
        cart.add_item(jeans());
        cart.add_item(shirt("M"));
        let before = cart.items().to_vec();

        cart.remove_item(&LineKey::new("p1", "Black", "XL"));
        assert_eq!(cart.items(), before.as_slice());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut cart = empty_cart();
        cart.add_item(shirt("M"));
        cart.clear();
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Price::ZERO);
        assert_eq!(cart.total_item_count(), 0);
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = Cart::load(Arc::clone(&store));

        cart.add_item(shirt("M").with_quantity(2));
        cart.add_item(jeans());
        cart.update_quantity(&LineKey::new("p2", "Blue", "L"), 4);

        let reloaded = Cart::load(Arc::clone(&store));
        assert_eq!(reloaded.items(), cart.items());
        assert_eq!(reloaded.total_item_count(), 6);

        cart.clear();
        assert!(Cart::load(store).is_empty());
    }

    #[test]
    fn test_emptied_cart_removes_stored_entry() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = Cart::load(Arc::clone(&store));

        cart.add_item(jeans());
        assert!(store.get(keys::CART).unwrap().is_some());

        cart.remove_item(&LineKey::new("p2", "Blue", "L"));
        assert_eq!(store.get(keys::CART).unwrap(), None);

        cart.add_item(shirt("M"));
        cart.clear();
        assert_eq!(store.get(keys::CART).unwrap(), None);
        assert!(cart.last_persist_error().is_none());
    }

    #[test]
    fn test_newer_snapshot_is_left_untouched() {
        let newer = r#"{"version":2,"items":[{"displayId":"a","productId":"p1","color":"Black","size":"M","name":"Shirt","unitPrice":"4500","quantity":1,"giftWrap":true}]}"#;
        let store = Arc::new(MemoryStore::with_entry(keys::CART, newer));

        let cart = Cart::load(Arc::clone(&store));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_price(), Price::from_dinars(4500));
        assert_eq!(store.get(keys::CART).unwrap().as_deref(), Some(newer));
    }

    #[test]
    fn test_nested_version_one_snapshot_is_restored_and_rewritten() {
        let legacy = r#"{"state":{"items":[{"id":"1700000000000","productId":3,"name":"Elegant Casual Shirt","price":4200,"color":"White","size":"L","quantity":2}]},"version":1}"#;
        let store = Arc::new(MemoryStore::with_entry(keys::CART, legacy));

        let cart = Cart::load(Arc::clone(&store));
        assert_eq!(cart.total_item_count(), 2);
        assert_eq!(cart.total_price(), Price::from_dinars(8400));
        assert!(cart.get(&LineKey::new("3", "White", "L")).is_some());

        let rewritten = store.get(keys::CART).unwrap().unwrap();
        assert!(rewritten.starts_with("{\"version\":1,\"items\""));
    }

    #[test]
    fn test_failed_write_keeps_memory_state() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = Cart::load(Arc::clone(&store));
        cart.add_item(jeans());

        store.fail_writes(true);
        cart.add_item(shirt("M"));

        assert_eq!(cart.len(), 2);
        assert!(matches!(
            cart.last_persist_error(),
            Some(PersistError::Storage(_))
        ));

        store.fail_writes(false);
        cart.update_quantity(&LineKey::new("p1", "Black", "M"), 2);
        assert!(cart.last_persist_error().is_none());
        assert_eq!(Cart::load(store).total_item_count(), 3);
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let store = MemoryStore::with_entry(keys::CART, "{{{ not json");
        let cart = Cart::load(store);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_legacy_snapshot_is_migrated_and_rewritten() {
        let legacy = r#"{"version":0,"items":[{"id":"x","modelId":"p1","name":"Shirt","price":4500,"color":"Black","size":"M","quantity":2}]}"#;
        let store = Arc::new(MemoryStore::with_entry(keys::CART, legacy));

        let cart = Cart::load(Arc::clone(&store));
        assert_eq!(cart.total_price(), Price::from_dinars(9000));

        let rewritten = store.get(keys::CART).unwrap().unwrap();
        assert!(rewritten.starts_with("{\"version\":1"));
    }
}
