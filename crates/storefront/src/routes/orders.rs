//! Order routes.
//!
//! Placing an order and looking one up are public; listing and status
//! changes are admin-only.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use tajine_house_core::checkout::CreateOrderRequest;
use tajine_house_core::{OrderId, OrderStatusFilter};

use crate::db::RepositoryError;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::models::{Order, OrderWithItems};
use crate::services::orders::{OrderError, OrderService};
use crate::state::AppState;

fn order_id(id: std::result::Result<Path<OrderId>, PathRejection>) -> Result<OrderId> {
    id.map(|Path(id)| id)
        .map_err(|_| AppError::BadRequest("Invalid order ID".to_string()))
}

/// `POST /api/orders`
#[instrument(skip(state, body))]
pub async fn create_order(
    State(state): State<AppState>,
    body: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(request) = body?;
    let placed = OrderService::new(state.storage(), state.pricing())
        .place_order(request)
        .await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        &[
            ("order_id", placed.order.id.to_string()),
            ("total", placed.order.total.to_string()),
        ],
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Order placed successfully",
            "orderId": placed.order.id,
            "order": placed.order,
            "items": placed.items,
        })),
    ))
}

/// `GET /api/orders/{id}`
#[instrument(skip(state, id))]
pub async fn get_order(
    State(state): State<AppState>,
    id: std::result::Result<Path<OrderId>, PathRejection>,
) -> Result<Json<Value>> {
    let id = order_id(id)?;
    let OrderWithItems { order, items } = OrderService::new(state.storage(), state.pricing())
        .get_with_items(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    Ok(Json(json!({ "order": order, "items": items })))
}

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    status: Option<String>,
}

/// `GET /api/orders?status=all|active|<status>` (admin)
#[instrument(skip(state, admin, query), fields(admin = %admin.username))]
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    query: std::result::Result<Query<OrdersQuery>, QueryRejection>,
) -> Result<Json<Vec<OrderWithItems>>> {
    let Query(query) = query?;
    let filter: OrderStatusFilter = query
        .status
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(OrderError::from)?;

    let orders = OrderService::new(state.storage(), state.pricing())
        .list_with_items(filter)
        .await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    status: Option<String>,
}

/// `PUT /api/orders/{id}/status` (admin)
#[instrument(skip(state, admin, id, body), fields(admin = %admin.username))]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    id: std::result::Result<Path<OrderId>, PathRejection>,
    body: std::result::Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<Order>> {
    let id = order_id(id)?;
    let Json(update) = body?;
    let status = update
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Status is required".to_string()))?;

    let order = OrderService::new(state.storage(), state.pricing())
        .update_status(id, &status)
        .await
        .map_err(|e| match e {
            OrderError::Repository(RepositoryError::NotFound) => {
                AppError::NotFound("Order not found".to_string())
            }
            other => other.into(),
        })?;
    Ok(Json(order))
}
