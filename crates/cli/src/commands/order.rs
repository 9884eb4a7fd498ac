//! `th-cli order <id>`

use std::io::Write;

use tajine_house_core::pricing::line_total;
use tajine_house_core::{OrderId, format_money};

use crate::api::OrderApi;
use crate::error::CliError;

/// Print an order, its status and the item snapshots.
pub async fn show(api: &dyn OrderApi, id: OrderId, out: &mut impl Write) -> Result<(), CliError> {
    let details = api.order(id).await?.ok_or(CliError::OrderNotFound(id))?;
    let order = &details.order;

    writeln!(
        out,
        "Order #{}  {}  placed {}",
        order.id,
        order.status,
        order.created_at.format("%Y-%m-%d %H:%M UTC")
    )?;
    writeln!(out, "{}", order.customer.full_name())?;
    writeln!(out, "{}", order.customer.delivery_address())?;
    for item in &details.items {
        writeln!(
            out,
            "  {} x {:<28} {:>9}",
            item.quantity,
            item.name,
            format_money(line_total(item.price, item.quantity))
        )?;
    }
    writeln!(out, "Subtotal:     {:>9}", format_money(order.subtotal))?;
    writeln!(out, "Delivery fee: {:>9}", format_money(order.delivery_fee))?;
    writeln!(out, "Total:        {:>9}", format_money(order.total))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::OrderDetails;
    use crate::commands::fake::FakeApi;

    fn placed_order() -> OrderDetails {
        serde_json::from_value(json!({
            "order": {
                "id": 7,
                "firstName": "Youssef",
                "lastName": "Alaoui",
                "email": "youssef@example.com",
                "phone": "0600000000",
                "address": "3 Place Bellecour",
                "city": "Lyon",
                "zipCode": "69002",
                "deliveryOption": "pickup",
                "deliveryTime": "19:30",
                "paymentMethod": "cash",
                "subtotal": "90.00",
                "deliveryFee": "6.30",
                "tax": "0.00",
                "total": "96.30",
                "status": "out_for_delivery",
                "createdAt": "2026-03-14T18:05:00Z"
            },
            "items": [{
                "id": 1,
                "orderId": 7,
                "menuItemId": 3,
                "name": "Chicken Pastilla",
                "price": "18.00",
                "quantity": 5
            }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_show_order() {
        let api = FakeApi {
            orders: vec![placed_order()],
            ..FakeApi::default()
        };
        let mut out = Vec::new();
        show(&api, OrderId::new(7), &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Order #7  out_for_delivery  placed 2026-03-14 18:05 UTC\n"));
        assert!(text.contains("Pickup at the restaurant"));
        assert!(text.contains("5 x Chicken Pastilla"));
        assert!(text.contains("$90.00"));
        assert!(text.contains("Total:           $96.30"));
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let api = FakeApi::default();
        let err = show(&api, OrderId::new(99), &mut Vec::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "order 99 not found");
    }
}
