//! Data access for the storefront.
//!
//! Handlers never touch a concrete store: they go through the [`Storage`]
//! trait held in [`AppState`](crate::state::AppState) as `Arc<dyn Storage>`.
//! [`MemoryStorage`] is the in-process implementation.
//!
//! Lookups return `Ok(None)` for unknown IDs; mutations of unknown rows
//! return [`RepositoryError::NotFound`]. Lists are in ascending ID order.

mod memory;
pub mod seed;

pub use memory::MemoryStorage;

use async_trait::async_trait;
use thiserror::Error;

use tajine_house_core::checkout::OrderLine;
use tajine_house_core::{CategoryId, MenuItemId, OrderId, OrderItemId, OrderStatus, UserId};

use crate::models::{
    Category, MenuItem, MenuItemUpdate, NewCategory, NewMenuItem, NewOrder, NewOrderItem, NewUser,
    Order, OrderItem, OrderWithItems, User,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The order's workflow does not allow this status change.
    #[error("cannot transition order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

/// CRUD operations over every storefront entity.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check that the store can serve requests.
    async fn ping(&self) -> Result<(), RepositoryError>;

    // Users

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    /// Find the SSO account bound to an identity provider subject.
    async fn get_user_by_sso_subject(&self, subject: &str) -> Result<Option<User>, RepositoryError>;

    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the username or SSO subject
    /// is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    // Categories

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError>;

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the slug is taken.
    async fn create_category(&self, category: NewCategory) -> Result<Category, RepositoryError>;

    // Menu items

    async fn get_menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError>;

    async fn list_menu_items(&self) -> Result<Vec<MenuItem>, RepositoryError>;

    async fn list_menu_items_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<MenuItem>, RepositoryError>;

    async fn create_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, RepositoryError>;

    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown ID.
    async fn update_menu_item(
        &self,
        id: MenuItemId,
        update: MenuItemUpdate,
    ) -> Result<MenuItem, RepositoryError>;

    /// Returns whether a row was deleted.
    async fn delete_menu_item(&self, id: MenuItemId) -> Result<bool, RepositoryError>;

    // Orders

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError>;

    /// Create an order in `pending` status, stamped with the current time.
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    /// Move an order to `status`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown ID and
    /// [`RepositoryError::InvalidTransition`] when the workflow forbids it.
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError>;

    // Order items

    async fn get_order_item(&self, id: OrderItemId) -> Result<Option<OrderItem>, RepositoryError>;

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError>;

    async fn add_order_item(&self, item: NewOrderItem) -> Result<OrderItem, RepositoryError>;

    /// Create an order and snapshot its lines in a single step.
    async fn create_order_with_items(
        &self,
        order: NewOrder,
        lines: Vec<OrderLine>,
    ) -> Result<OrderWithItems, RepositoryError>;
}
