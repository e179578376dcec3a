// HTTP handlers for order endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::cart::ClientQuery;
use crate::error::{ApiError, ErrorResponse};
use crate::orders::{CreateOrderRequest, Order, UpdateStatusRequest};

/// Handler for POST /api/orders
/// Checks out the client's cart into a new order
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created with frozen line prices", body = Order),
        (status = 400, description = "Malformed client id or empty cart", body = ErrorResponse),
        (status = 503, description = "Data store unavailable", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    request.validate()?;

    let order = state.order_service.checkout(&request.client_id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Handler for GET /api/orders
/// Lists a client's orders, newest first
#[utoipa::path(
    get,
    path = "/api/orders",
    params(ClientQuery),
    responses(
        (status = 200, description = "Orders for the client", body = Vec<Order>),
        (status = 400, description = "Malformed client id", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn list_orders_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<ClientQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state.order_service.list_for_client(&query.client_id).await?;
    Ok(Json(orders))
}

/// Handler for GET /api/orders/{order_id}
/// Returns the order exactly as stored at checkout
#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order found", body = Order),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order_handler(
    State(state): State<crate::AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = state.order_service.get_order(order_id).await?;
    Ok(Json(order))
}

/// Handler for PATCH /api/orders/{order_id}/status
/// Moves an order along the shipping status machine
#[utoipa::path(
    patch,
    path = "/api/orders/{order_id}/status",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Order),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order_status_handler(
    State(state): State<crate::AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .order_service
        .update_status(order_id, request.status)
        .await?;
    Ok(Json(order))
}
