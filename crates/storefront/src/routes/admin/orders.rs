//! Order management.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use hembit_core::{OrderId, OrderStatus};

use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Order;
use crate::routes::non_blank;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

/// Every order, newest first.
#[instrument(skip(state, _admin))]
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<OrdersResponse> {
    let orders = state.store().read(|doc| doc.orders.clone());
    Json(OrdersResponse { orders })
}

#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: Order,
}

/// Move an order to any status and record it in the timeline.
#[instrument(skip(state, _admin, input))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
    ApiJson(input): ApiJson<StatusInput>,
) -> Result<Json<OrderResponse>> {
    let status = non_blank(input.status.as_ref())
        .map(OrderStatus::new)
        .ok_or_else(|| AppError::bad_request("status is required"))?;

    let order = state.store().try_write(|doc| {
        let order = doc
            .find_order_mut(&id)
            .ok_or_else(|| AppError::not_found("Order not found"))?;
        order.transition(status, Utc::now());
        Ok::<_, AppError>(order.clone())
    })?;
    tracing::info!(order_id = %order.id, status = %order.status, "order status updated");

    Ok(Json(OrderResponse { order }))
}
