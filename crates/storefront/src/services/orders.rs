//! Order placement and the status workflow.
//!
//! The server is authoritative for money: amounts are recomputed from the
//! submitted lines with the configured [`PricingPolicy`]. Whatever totals the
//! client sent are only compared and logged.

use rust_decimal::Decimal;
use thiserror::Error;

use tajine_house_core::checkout::{CheckoutError, CreateOrderRequest, prepare_order};
use tajine_house_core::pricing::{CartTotals, PricingPolicy};
use tajine_house_core::{OrderId, OrderStatus, OrderStatusFilter, ParseOrderStatusError};

use crate::db::{RepositoryError, Storage};
use crate::models::{NewOrder, Order, OrderWithItems};

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    UnknownStatus(#[from] ParseOrderStatusError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Order service over a store and a pricing policy.
pub struct OrderService<'a> {
    storage: &'a dyn Storage,
    pricing: PricingPolicy,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(storage: &'a dyn Storage, pricing: PricingPolicy) -> Self {
        Self { storage, pricing }
    }

    /// Validate, price and store an order with its item snapshots.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Checkout` when the request fails checkout rules.
    #[tracing::instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn place_order(&self, request: CreateOrderRequest) -> Result<OrderWithItems, OrderError> {
        let CreateOrderRequest { order, items } = request;
        let client_amounts = [order.subtotal, order.delivery_fee, order.tax, order.total];

        let summary = prepare_order(items, order.customer, &self.pricing)?;
        log_amount_mismatch(&client_amounts, &summary.totals);

        let new_order = NewOrder {
            customer: summary.customer,
            subtotal: summary.totals.subtotal,
            delivery_fee: summary.totals.delivery_fee,
            tax: summary.totals.tax,
            total: summary.totals.total,
        };
        let created = self
            .storage
            .create_order_with_items(new_order, summary.lines)
            .await?;

        tracing::info!(
            order_id = %created.order.id,
            total = %created.order.total,
            items = created.items.len(),
            "order placed"
        );
        Ok(created)
    }

    /// Move an order to the status named by `status`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::UnknownStatus` for an unrecognised name and
    /// `RepositoryError::InvalidTransition` when the workflow forbids it.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: &str) -> Result<Order, OrderError> {
        let status: OrderStatus = status.trim().parse()?;
        let order = self.storage.update_order_status(id, status).await?;
        tracing::info!(order_id = %id, %status, "order status updated");
        Ok(order)
    }

    /// An order and its items.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the store fails.
    pub async fn get_with_items(&self, id: OrderId) -> Result<Option<OrderWithItems>, OrderError> {
        let Some(order) = self.storage.get_order(id).await? else {
            return Ok(None);
        };
        let items = self.storage.list_order_items(id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    /// Every order passing `filter`, each with its items.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the store fails.
    pub async fn list_with_items(
        &self,
        filter: OrderStatusFilter,
    ) -> Result<Vec<OrderWithItems>, OrderError> {
        let orders = self.storage.list_orders().await?;
        let mut out = Vec::with_capacity(orders.len());
        for order in orders.into_iter().filter(|o| filter.matches(o.status)) {
            let items = self.storage.list_order_items(order.id).await?;
            out.push(OrderWithItems { order, items });
        }
        Ok(out)
    }
}

fn log_amount_mismatch(client: &[Option<Decimal>; 4], server: &CartTotals) {
    let expected = [server.subtotal, server.delivery_fee, server.tax, server.total];
    let differs = client
        .iter()
        .zip(expected)
        .any(|(sent, computed)| sent.is_some_and(|sent| sent != computed));
    if differs {
        tracing::debug!(
            client_subtotal = ?client[0],
            client_total = ?client[3],
            subtotal = %server.subtotal,
            total = %server.total,
            "client-sent amounts differ from recomputed totals"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tajine_house_core::checkout::{CustomerForm, OrderDetails, OrderLine};
    use tajine_house_core::MenuItemId;

    use super::*;
    use crate::db::MemoryStorage;
    use crate::models::MenuItemUpdate;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn customer() -> CustomerForm {
        CustomerForm {
            first_name: "Youssef".to_owned(),
            last_name: "Alaoui".to_owned(),
            email: "youssef@riad.example".to_owned(),
            phone: "0612345678".to_owned(),
            address: "12 Rue des Orangers".to_owned(),
            city: "Fes".to_owned(),
            zip_code: "30000".to_owned(),
            delivery_time: "asap".to_owned(),
            ..CustomerForm::default()
        }
    }

    fn request(lines: Vec<OrderLine>, total: Option<Decimal>) -> CreateOrderRequest {
        CreateOrderRequest {
            order: OrderDetails {
                customer: customer(),
                subtotal: None,
                delivery_fee: None,
                tax: None,
                total,
            },
            items: lines,
        }
    }

    fn line(id: i32, price: &str, quantity: u32) -> OrderLine {
        OrderLine {
            id: MenuItemId::new(id),
            name: format!("Dish {id}"),
            price: dec(price),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_place_order_recomputes_totals() {
        let store = MemoryStorage::new();
        let service = OrderService::new(&store, PricingPolicy::default());

        // Client claims a total of 1.00; the server ignores it.
        let placed = service
            .place_order(request(vec![line(1, "40", 1), line(2, "20", 2)], Some(dec("1"))))
            .await
            .unwrap();

        assert_eq!(placed.order.subtotal, dec("80.00"));
        assert_eq!(placed.order.delivery_fee, dec("5.60"));
        assert_eq!(placed.order.total, dec("85.60"));
        assert_eq!(placed.order.tax, dec("0.00"));
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.items.len(), 2);
    }

    #[tokio::test]
    async fn test_place_order_enforces_minimum() {
        let store = MemoryStorage::new();
        let service = OrderService::new(&store, PricingPolicy::default());

        let err = service
            .place_order(request(vec![line(1, "25", 2)], None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::Checkout(CheckoutError::BelowMinimum { shortfall, .. }) if shortfall == dec("30.00")
        ));
        assert!(store.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_survives_menu_price_change() {
        let store = MemoryStorage::new();
        crate::db::seed::seed_menu(&store).await.unwrap();
        let service = OrderService::new(&store, PricingPolicy::default());

        let dish = store.list_menu_items().await.unwrap().remove(0);
        let placed = service
            .place_order(request(
                vec![
                    OrderLine {
                        id: dish.id,
                        name: dish.name.clone(),
                        price: dish.price,
                        quantity: 3,
                    },
                    line(99, "25.00", 1),
                ],
                None,
            ))
            .await
            .unwrap();

        store
            .update_menu_item(
                dish.id,
                MenuItemUpdate {
                    price: Some(dec("99.99")),
                    ..MenuItemUpdate::default()
                },
            )
            .await
            .unwrap();

        let fetched = service.get_with_items(placed.order.id).await.unwrap().unwrap();
        assert_eq!(fetched.items.len(), 2);
        assert_eq!(fetched.items[0].price, dish.price);
    }

    #[tokio::test]
    async fn test_update_status() {
        let store = MemoryStorage::new();
        let service = OrderService::new(&store, PricingPolicy::default());
        let placed = service
            .place_order(request(vec![line(1, "90", 1)], None))
            .await
            .unwrap();
        let id = placed.order.id;

        let order = service.update_status(id, "preparing").await.unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);

        assert!(matches!(
            service.update_status(id, "shipped").await,
            Err(OrderError::UnknownStatus(_))
        ));
        assert!(matches!(
            service.update_status(id, "pending").await,
            Err(OrderError::Repository(RepositoryError::InvalidTransition { .. }))
        ));
        assert!(matches!(
            service.update_status(OrderId::new(404), "cancelled").await,
            Err(OrderError::Repository(RepositoryError::NotFound))
        ));
    }

    #[tokio::test]
    async fn test_list_with_items_filters() {
        let store = MemoryStorage::new();
        let service = OrderService::new(&store, PricingPolicy::default());
        let first = service
            .place_order(request(vec![line(1, "90", 1)], None))
            .await
            .unwrap();
        service
            .place_order(request(vec![line(2, "45", 2)], None))
            .await
            .unwrap();
        service.update_status(first.order.id, "delivered").await.unwrap();

        let all = service.list_with_items(OrderStatusFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|o| o.items.len() == 1));

        let active = service.list_with_items(OrderStatusFilter::Active).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_ne!(active[0].order.id, first.order.id);

        let delivered = service
            .list_with_items(OrderStatusFilter::Only(OrderStatus::Delivered))
            .await
            .unwrap();
        assert_eq!(delivered.len(), 1);
    }
}
