//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use domain::{Item, Order, PaymentMethod};
use orchestrator::{
    CreateOrder, InMemoryInventoryService, InMemoryPaymentService, OrderLine, OrderService,
    OrderServiceError, PayOrder,
};
use order_store::OrderStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Order service as wired into the HTTP server. The store is chosen at
/// startup, so it is held behind a trait object.
pub type AppOrderService =
    OrderService<Arc<dyn OrderStore>, InMemoryInventoryService, InMemoryPaymentService>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub order_service: AppOrderService,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub user_uuid: String,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    #[serde(default)]
    pub part_uuid: String,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct PayOrderRequest {
    #[serde(default)]
    pub payment_method: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CreateOrderResponse {
    pub order_uuid: String,
    pub total_price: f64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub order_uuid: String,
    pub user_uuid: String,
    pub items: Vec<OrderItemResponse>,
    pub total_price: f64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_uuid: Option<String>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub part_uuid: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct PayOrderResponse {
    pub transaction_uuid: String,
}

impl From<&Item> for OrderItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            part_uuid: item.part_id.to_string(),
            name: item.name.clone(),
            price: item.unit_price.as_f64(),
            quantity: item.quantity,
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            order_uuid: order.id().to_string(),
            user_uuid: order.user_id().to_string(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
            total_price: order.total_price().as_f64(),
            status: order.status().to_string(),
            payment_method: order.payment_method().map(|m| m.to_string()),
            transaction_uuid: order.transaction_id().map(|t| t.to_string()),
        }
    }
}

// -- Handlers --

/// POST /api/v1/orders: place a new order.
#[tracing::instrument(skip(state, payload))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let Json(req) = payload?;

    let lines = req
        .items
        .into_iter()
        .map(|item| OrderLine::new(item.part_uuid, item.quantity))
        .collect();

    let order = state
        .order_service
        .create_order(CreateOrder::new(req.user_uuid, lines))
        .await?;

    Ok(Json(CreateOrderResponse {
        order_uuid: order.id().to_string(),
        total_price: order.total_price().as_f64(),
    }))
}

/// GET /api/v1/orders/{order_uuid}: load an order.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.order_service.get_order(order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /api/v1/orders/{order_uuid}/pay: pay for an order.
#[tracing::instrument(skip(state, payload))]
pub async fn pay(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<PayOrderRequest>, JsonRejection>,
) -> Result<Json<PayOrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let Json(req) = payload?;
    let method = req.payment_method.as_deref().map(PaymentMethod::from_name);

    let transaction_id = state
        .order_service
        .pay_order(PayOrder::new(order_id, method))
        .await?;

    Ok(Json(PayOrderResponse {
        transaction_uuid: transaction_id.to_string(),
    }))
}

/// POST /api/v1/orders/{order_uuid}/cancel: cancel an unpaid order.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let order_id = parse_order_id(&id)?;
    state.order_service.cancel_order(order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// An id that is not a UUID cannot name a stored order, so it is reported as
/// not found.
fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse().map_err(|_| {
        ApiError::Service(OrderServiceError::NotFound(format!("order {id} not found")))
    })
}
