//! Domain models for the storefront.
//!
//! These are the records the [`Storage`](crate::db::Storage) hands out, plus
//! the insert/update payloads it accepts. Wire names are camelCase.

pub mod menu;
pub mod order;
pub mod session;
pub mod user;

pub use menu::{Category, MenuItem, MenuItemUpdate, NewCategory, NewMenuItem};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderWithItems};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, User};

/// A request field that breaks a model rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl ValidationError {
    #[must_use]
    pub const fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}
