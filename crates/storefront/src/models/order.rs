//! Orders and their item snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tajine_house_core::checkout::CustomerForm;
use tajine_house_core::{MenuItemId, OrderId, OrderItemId, OrderStatus};

/// A placed order.
///
/// The financial fields are fixed at creation; only `status` changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(flatten)]
    pub customer: CustomerForm,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Data for creating an order. New orders always start `pending`.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer: CustomerForm,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// A cart line frozen at order time, independent of later menu edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

/// Data for adding an item snapshot to an order.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

/// An order with its items inlined, as listed on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
