use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::OrderService;
use crate::auth::AuthenticatedUser;
use crate::domain::order::{CheckoutRequest, OrderLineView, OrderView};
use crate::domain::ports::OrderRepository;
use crate::errors::AppError;

pub const ORDER_DELETED: &str = "Заказ успешно удален";
pub const MAX_PAGE_SIZE: i64 = 100;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// `card` or `sbp`
    pub pay_method: Option<String>,
    /// Receipt e-mail, defaults to the account e-mail
    pub send_to: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderLineResponse {
    /// Product id, `null` once the product left the catalog
    pub id: Option<Uuid>,
    pub name: String,
    /// Unit price at checkout time
    pub price: i64,
    pub quantity: i32,
    pub cost: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub number_order: i64,
    pub pay_method: String,
    pub send_to: String,
    pub total_cost: i64,
    pub discount: Option<u8>,
    pub is_paid: bool,
    pub created_at: String,
    pub product_list: Vec<OrderLineResponse>,
}

impl From<OrderLineView> for OrderLineResponse {
    fn from(line: OrderLineView) -> Self {
        Self {
            id: line.product_id,
            cost: line.cost(),
            name: line.product_name,
            price: line.unit_price,
            quantity: line.quantity,
        }
    }
}

impl From<OrderView> for OrderResponse {
    fn from(order: OrderView) -> Self {
        Self {
            id: order.id,
            user: order.user_id,
            number_order: order.number_order,
            pay_method: order.pay_method,
            send_to: order.send_to,
            total_cost: order.total_cost,
            discount: order.discount.map(|d| d.value()),
            is_paid: order.is_paid,
            created_at: order.created_at.to_rfc3339(),
            product_list: order.lines.into_iter().map(OrderLineResponse::from).collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders/
///
/// Turns the selected cart items into an order. The order, its lines, the
/// cart cleanup and the outbox event are committed in one transaction.
#[utoipa::path(
    post,
    path = "/orders/",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = OrderResponse),
        (status = 400, description = "Empty cart or invalid payment details"),
        (status = 401, description = "No authenticated user"),
    ),
    tag = "orders"
)]
pub async fn create_order<R: OrderRepository>(
    service: web::Data<OrderService<R>>,
    user: AuthenticatedUser,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let request = CheckoutRequest {
        pay_method: body.pay_method,
        send_to: body.send_to,
    };

    let order = web::block(move || service.create_order(&user.0, request)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders/{id}/
#[utoipa::path(
    get,
    path = "/orders/{id}/",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order<R: OrderRepository>(
    service: web::Data<OrderService<R>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let result = web::block(move || service.get_order(user.id(), order_id)).await??;

    match result {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(order))),
        None => Err(AppError::NotFound),
    }
}

/// GET /orders/
///
/// The caller's orders, newest first.
/// Use `page` (1-based) and `limit` to control pagination.
#[utoipa::path(
    get,
    path = "/orders/",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders<R: OrderRepository>(
    service: web::Data<OrderService<R>>,
    user: AuthenticatedUser,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, MAX_PAGE_SIZE);

    let result = web::block(move || service.list_orders(user.id(), page, limit)).await??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// PATCH /orders/{id}/is_paid/
///
/// Marks the order as paid. Repeating the call is harmless.
#[utoipa::path(
    patch,
    path = "/orders/{id}/is_paid/",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order is paid", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn mark_paid<R: OrderRepository>(
    service: web::Data<OrderService<R>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || service.mark_paid(user.id(), order_id)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// DELETE /orders/{id}/
///
/// Only unpaid orders can be deleted.
#[utoipa::path(
    delete,
    path = "/orders/{id}/",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order deleted"),
        (status = 400, description = "Order is already paid"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn delete_order<R: OrderRepository>(
    service: web::Data<OrderService<R>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    web::block(move || service.delete_order(user.id(), order_id)).await??;

    Ok(HttpResponse::Ok().json(json!({ "message": ORDER_DELETED })))
}
