//! In-memory [`OrderApi`] for command tests.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tajine_house_core::checkout::CreateOrderRequest;
use tajine_house_core::{CategoryId, MenuItemId, OrderId};
use tajine_house_storefront::models::MenuItem;

use crate::api::{OrderApi, OrderDetails, PlacedOrder};
use crate::error::CliError;

#[derive(Default)]
pub struct FakeApi {
    pub menu: Vec<MenuItem>,
    pub orders: Vec<OrderDetails>,
    pub placed: Mutex<Vec<CreateOrderRequest>>,
    pub fail_orders: bool,
}

pub fn dish(id: i32, name: &str, cents: i64, category: i32) -> MenuItem {
    MenuItem {
        id: MenuItemId::new(id),
        name: name.to_owned(),
        description: String::new(),
        price: Decimal::new(cents, 2),
        image: format!("https://img.example/{id}.jpg"),
        category_id: CategoryId::new(category),
        featured: id == 1,
        tags: String::new(),
    }
}

impl FakeApi {
    pub fn with_menu() -> Self {
        Self {
            menu: vec![
                dish(1, "Couscous Royal", 2295, 1),
                dish(2, "Tajine d'agneau", 2450, 1),
                dish(6, "Moroccan Mint Tea", 595, 4),
            ],
            ..Self::default()
        }
    }
}

#[async_trait]
impl OrderApi for FakeApi {
    async fn menu_items(&self, category: Option<CategoryId>) -> Result<Vec<MenuItem>, CliError> {
        Ok(self
            .menu
            .iter()
            .filter(|item| category.is_none_or(|c| item.category_id == c))
            .cloned()
            .collect())
    }

    async fn menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, CliError> {
        Ok(self.menu.iter().find(|item| item.id == id).cloned())
    }

    async fn place_order(&self, request: &CreateOrderRequest) -> Result<PlacedOrder, CliError> {
        if self.fail_orders {
            return Err(CliError::Api {
                status: 500,
                message: "Internal server error".to_owned(),
            });
        }
        let mut placed = self.placed.lock().unwrap();
        placed.push(request.clone());
        Ok(PlacedOrder {
            message: "Order placed successfully".to_owned(),
            order_id: OrderId::new(i32::try_from(placed.len()).unwrap()),
        })
    }

    async fn order(&self, id: OrderId) -> Result<Option<OrderDetails>, CliError> {
        Ok(self.orders.iter().find(|o| o.order.id == id).cloned())
    }
}
