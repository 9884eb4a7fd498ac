//! The cart engine.
//!
//! A [`Cart`] is the customer's list of selected dishes before checkout. It
//! lives on the client: every mutation is written through a [`CartStorage`]
//! under [`CART_STORAGE_KEY`] as a JSON array, and [`Cart::load`] rehydrates
//! it on the next start.
//!
//! ```
//! use rust_decimal::Decimal;
//! use tajine_house_core::cart::{Cart, CartItem, MemoryCartStorage};
//! use tajine_house_core::MenuItemId;
//!
//! let mut cart = Cart::load(MemoryCartStorage::default());
//! let couscous = CartItem::new(MenuItemId::new(1), "Couscous Royal", Decimal::new(2295, 2), 2, "")?;
//! cart.add_item(couscous)?;
//! assert_eq!(cart.calculate_subtotal(), Decimal::new(4590, 2));
//! # Ok::<(), tajine_house_core::cart::CartError>(())
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::{CartTotals, PricingPolicy, line_total};
use crate::types::MenuItemId;

/// Fixed key the cart is persisted under.
pub const CART_STORAGE_KEY: &str = "tajine-house-cart";

/// Errors from cart operations.
#[derive(Debug, thiserror::Error)]
pub enum CartError {
    /// Quantities must be at least one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// Prices cannot be negative.
    #[error("price cannot be negative")]
    NegativePrice,

    /// No line with this menu item id.
    #[error("menu item {0} is not in the cart")]
    ItemNotFound(MenuItemId),

    /// Persisting the cart failed. The in-memory cart is already updated.
    #[error(transparent)]
    Storage(#[from] CartStorageError),
}

/// Errors raised by a [`CartStorage`] backend.
#[derive(Debug, thiserror::Error)]
pub enum CartStorageError {
    #[error("cart storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cart could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cart storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable key/value storage for the serialized cart.
pub trait CartStorage {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, CartStorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<(), CartStorageError>;
}

impl<S: CartStorage + ?Sized> CartStorage for &S {
    fn load(&self, key: &str) -> Result<Option<String>, CartStorageError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), CartStorageError> {
        (**self).save(key, value)
    }
}

/// In-process [`CartStorage`], useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCartStorage {
    /// Storage pre-populated with one entry.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::default();
        if let Ok(mut entries) = storage.entries.lock() {
            entries.insert(key.to_owned(), value.to_owned());
        }
        storage
    }

    /// Current raw value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self, key: &str) -> Result<Option<String>, CartStorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| CartStorageError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), CartStorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CartStorageError::Unavailable(e.to_string()))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    id: MenuItemId,
    name: String,
    price: Decimal,
    quantity: u32,
    image: String,
}

impl CartItem {
    /// Create a cart line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity and
    /// [`CartError::NegativePrice`] for a negative price.
    pub fn new(
        id: MenuItemId,
        name: impl Into<String>,
        price: Decimal,
        quantity: u32,
        image: impl Into<String>,
    ) -> Result<Self, CartError> {
        let item = Self {
            id,
            name: name.into(),
            price,
            quantity,
            image: image.into(),
        };
        item.validate()?;
        Ok(item)
    }

    fn validate(&self) -> Result<(), CartError> {
        if self.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(CartError::NegativePrice);
        }
        Ok(())
    }

    #[must_use]
    pub const fn id(&self) -> MenuItemId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        line_total(self.price, self.quantity)
    }
}

/// The customer's cart, written through to storage on every mutation.
#[derive(Debug)]
pub struct Cart<S: CartStorage> {
    items: Vec<CartItem>,
    storage: S,
    pricing: PricingPolicy,
}

impl<S: CartStorage> Cart<S> {
    /// Rehydrate the cart from storage with the default pricing policy.
    ///
    /// Missing, unreadable or malformed data yields an empty cart.
    pub fn load(storage: S) -> Self {
        Self::load_with_pricing(storage, PricingPolicy::default())
    }

    /// Rehydrate the cart from storage with a specific pricing policy.
    pub fn load_with_pricing(storage: S, pricing: PricingPolicy) -> Self {
        let items = match storage.load(CART_STORAGE_KEY) {
            Ok(Some(raw)) => parse_items(&raw).unwrap_or_else(|reason| {
                tracing::warn!(%reason, "discarding malformed persisted cart");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read persisted cart, starting empty");
                Vec::new()
            }
        };

        Self {
            items,
            storage,
            pricing,
        }
    }

    /// Lines currently in the cart, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// The pricing policy used for the derived amounts.
    #[must_use]
    pub const fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    /// Add a line, or grow the existing line with the same menu item id.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the cart cannot be persisted.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        if let Some(existing) = self.items.iter_mut().find(|line| line.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
        self.persist()
    }

    /// Drop every line for this menu item.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the cart cannot be persisted.
    pub fn remove_item(&mut self, id: MenuItemId) -> Result<(), CartError> {
        self.items.retain(|line| line.id != id);
        self.persist()
    }

    /// Replace the quantity of a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for zero,
    /// [`CartError::ItemNotFound`] if the line does not exist, and
    /// [`CartError::Storage`] if the cart cannot be persisted.
    pub fn update_quantity(&mut self, id: MenuItemId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        self.line_mut(id)?.quantity = quantity;
        self.persist()
    }

    /// Add one to a line's quantity.
    ///
    /// # Errors
    ///
    /// Same as [`Cart::update_quantity`].
    pub fn increment(&mut self, id: MenuItemId) -> Result<(), CartError> {
        let line = self.line_mut(id)?;
        line.quantity = line.quantity.saturating_add(1);
        self.persist()
    }

    /// Take one off a line's quantity, never going below one.
    ///
    /// # Errors
    ///
    /// Same as [`Cart::update_quantity`].
    pub fn decrement(&mut self, id: MenuItemId) -> Result<(), CartError> {
        let line = self.line_mut(id)?;
        line.quantity = line.quantity.saturating_sub(1).max(1);
        self.persist()
    }

    /// Empty the cart and persist the empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the cart cannot be persisted.
    pub fn clear_cart(&mut self) -> Result<(), CartError> {
        self.items.clear();
        self.persist()
    }

    /// Sum of price times quantity over all lines.
    #[must_use]
    pub fn calculate_subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    #[must_use]
    pub fn delivery_fee(&self) -> Decimal {
        self.pricing.delivery_fee(self.calculate_subtotal())
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.pricing.total(self.calculate_subtotal())
    }

    #[must_use]
    pub fn meets_minimum_order(&self) -> bool {
        self.pricing.meets_minimum_order(self.calculate_subtotal())
    }

    /// Every derived amount for the current contents.
    #[must_use]
    pub fn summary(&self) -> CartTotals {
        self.pricing.totals(self.calculate_subtotal())
    }

    fn line_mut(&mut self, id: MenuItemId) -> Result<&mut CartItem, CartError> {
        self.items
            .iter_mut()
            .find(|line| line.id == id)
            .ok_or(CartError::ItemNotFound(id))
    }

    fn persist(&self) -> Result<(), CartError> {
        let json = serde_json::to_string(&self.items).map_err(CartStorageError::from)?;
        self.storage.save(CART_STORAGE_KEY, &json)?;
        Ok(())
    }
}

/// Parse a persisted cart, rejecting lines that break the cart invariants.
fn parse_items(raw: &str) -> Result<Vec<CartItem>, String> {
    let items: Vec<CartItem> = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    for item in &items {
        item.validate()
            .map_err(|e| format!("menu item {}: {e}", item.id))?;
    }
    Ok(items)
}
