use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bodega_order::models::Order;
use bodega_order::workflow::PlaceOrder;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderEnvelope {
    pub message: String,
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/createorder", post(create_order))
        .route("/update_order_status/{order_id}", put(update_order_status))
        .route("/get_user_orders/{mobile_number}", get(get_user_orders))
        .route("/get_all_orders", get(get_all_orders))
        .route("/delete_order/{order_id}", delete(delete_order))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /createorder
/// Validate every requested line, reserve stock, persist the order.
async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<OrderEnvelope>), AppError> {
    let order = state.workflow.place_order(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderEnvelope {
            message: "Order created successfully".to_string(),
            order,
        }),
    ))
}

/// PUT /update_order_status/{order_id}
async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderEnvelope>, AppError> {
    let status = req
        .status
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::ValidationError("Status is required".to_string()))?;

    let order = state.workflow.update_status(order_id, &status).await?;

    Ok(Json(OrderEnvelope {
        message: "Order status updated successfully".to_string(),
        order,
    }))
}

/// GET /get_user_orders/{mobile_number}
/// A customer with no orders gets an empty list, not an error.
async fn get_user_orders(
    State(state): State<AppState>,
    Path(mobile_number): Path<String>,
) -> Result<Json<OrderListResponse>, AppError> {
    let orders = state.workflow.orders_for_customer(&mobile_number).await?;
    Ok(Json(OrderListResponse { orders }))
}

/// GET /get_all_orders
/// Newest first.
async fn get_all_orders(
    State(state): State<AppState>,
) -> Result<Json<OrderListResponse>, AppError> {
    let orders = state.workflow.list_orders().await?;
    Ok(Json(OrderListResponse { orders }))
}

/// DELETE /delete_order/{order_id}
async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.workflow.delete_order(order_id).await?;
    Ok(Json(MessageResponse {
        message: "Order deleted successfully".to_string(),
    }))
}
