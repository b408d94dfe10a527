//! Purchase order endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{ApiResponse, ApiResult, AuthenticatedUser};
use crate::{
    error::AppResult,
    models::{
        book::Book,
        order::{CreateOrder, CreatedOrder, OrderDetails, OrderSummary, PublicOrder, ReceiveDelivery},
    },
    AppState,
};

/// Place an order. Every copy gets a library barcode immediately.
#[utoipa::path(
    post,
    path = "/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    request_body = CreateOrder,
    responses(
        (status = 201, description = "Order placed", body = CreatedOrder),
        (status = 400, description = "Empty order or too many copies"),
        (status = 404, description = "Supplier not found")
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(order): Json<CreateOrder>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatedOrder>>)> {
    let created = state.services.orders.create(&identity, &order).await?;
    let message = format!("Order placed, {} barcode(s) assigned", created.generated_ids.len());
    Ok((StatusCode::CREATED, ApiResponse::with_message(created, message)))
}

/// List orders, newest first
#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orders with item counters", body = Vec<OrderSummary>)
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> ApiResult<Vec<OrderSummary>> {
    identity.require_staff()?;
    let orders = state.services.orders.list().await?;
    Ok(ApiResponse::ok(orders))
}

/// Order with its items
#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order details", body = OrderDetails),
        (status = 404, description = "Order not found")
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<i32>,
) -> ApiResult<OrderDetails> {
    identity.require_staff()?;
    let order = state.services.orders.get(id).await?;
    Ok(ApiResponse::ok(order))
}

/// Mark an ordered copy as delivered; it becomes an available book
#[utoipa::path(
    post,
    path = "/order-items/{id}/receive",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order item ID")),
    request_body = ReceiveDelivery,
    responses(
        (status = 200, description = "Copy received", body = Book),
        (status = 404, description = "Order item or category not found"),
        (status = 409, description = "Copy already received")
    )
)]
pub async fn receive_item(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<i32>,
    delivery: Option<Json<ReceiveDelivery>>,
) -> ApiResult<Book> {
    identity.require_staff()?;
    let delivery = delivery.map(|Json(d)| d).unwrap_or_default();
    let book = state.services.orders.receive(id, &delivery).await?;
    Ok(ApiResponse::with_message(book, "Copy received"))
}

/// Books created from one order item
#[utoipa::path(
    get,
    path = "/order-items/{id}/barcodes",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order item ID")),
    responses(
        (status = 200, description = "Received copies", body = Vec<Book>),
        (status = 404, description = "Order item not found")
    )
)]
pub async fn item_barcodes(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<i32>,
) -> ApiResult<Vec<Book>> {
    identity.require_staff()?;
    let books = state.services.orders.item_books(id).await?;
    Ok(ApiResponse::ok(books))
}

/// Public view of an order, for the label printing link
#[utoipa::path(
    get,
    path = "/order/{token}",
    tag = "orders",
    params(("token" = String, Path, description = "Public order token")),
    responses(
        (status = 200, description = "Order items and barcodes", body = PublicOrder),
        (status = 404, description = "Unknown token")
    )
)]
pub async fn public_order(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<PublicOrder> {
    let order = state.services.orders.get_by_token(&token).await?;
    Ok(ApiResponse::ok(order))
}
