use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::CartService;
use crate::auth::AuthenticatedUser;
use crate::domain::cart::{CartLine, CartSnapshot};
use crate::domain::ports::{CartRepository, CatalogRepository};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct PromocodeRequest {
    #[serde(default)]
    pub promocode: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItemResponse {
    /// Product id
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    /// `price × quantity`
    pub cost: i64,
    pub is_selected: bool,
    pub in_favorite: bool,
    pub category: CategoryResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartResponse {
    /// `null` until the first item is added
    pub id: Option<Uuid>,
    /// Cost of the selected items before any discount
    pub total_cost: i64,
    /// Units across the selected items
    pub total_amount: i64,
    /// Same as `total_amount`
    pub total_quantity: i64,
    /// Cost of the selected items after the promo discount, `null` without one
    pub discount_amount: Option<i64>,
    /// Discount percent, `null` without a promo code
    pub discount: Option<u8>,
    pub items: Vec<CartItemResponse>,
}

impl From<CartLine> for CartItemResponse {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.product_id,
            cost: line.cost(),
            name: line.name,
            price: line.price,
            quantity: line.quantity,
            is_selected: line.selected,
            in_favorite: line.in_favorite,
            category: CategoryResponse {
                id: line.category.id,
                name: line.category.name,
            },
        }
    }
}

impl From<CartSnapshot> for CartResponse {
    fn from(cart: CartSnapshot) -> Self {
        let total_quantity = cart.total_quantity();
        Self {
            id: cart.id,
            total_cost: cart.total_cost(),
            total_amount: total_quantity,
            total_quantity,
            discount_amount: cart.discount.map(|_| cart.discounted_cost()),
            discount: cart.discount.map(|d| d.value()),
            items: cart.lines.into_iter().map(CartItemResponse::from).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /cart/
///
/// Returns the caller's cart with totals over the selected items.
#[utoipa::path(
    get,
    path = "/cart/",
    responses(
        (status = 200, description = "Current cart", body = CartResponse),
        (status = 401, description = "No authenticated user"),
    ),
    tag = "cart"
)]
pub async fn get_cart<R: CartRepository + CatalogRepository>(
    service: web::Data<CartService<R>>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let cart = web::block(move || service.get_cart(user.id())).await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// POST /cart/promocode/
#[utoipa::path(
    post,
    path = "/cart/promocode/",
    request_body = PromocodeRequest,
    responses(
        (status = 200, description = "Discount applied", body = CartResponse),
        (status = 400, description = "Unknown promo code"),
    ),
    tag = "cart"
)]
pub async fn apply_promocode<R: CartRepository + CatalogRepository>(
    service: web::Data<CartService<R>>,
    user: AuthenticatedUser,
    body: web::Json<PromocodeRequest>,
) -> Result<HttpResponse, AppError> {
    let code = body.into_inner().promocode;
    let cart = web::block(move || service.apply_promocode(user.id(), code.trim())).await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// POST /products/{id}/shopping_cart/
///
/// Adds one unit of the product, creating the cart line if needed.
#[utoipa::path(
    post,
    path = "/products/{id}/shopping_cart/",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 201, description = "Item added", body = CartResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "cart"
)]
pub async fn add_item<R: CartRepository + CatalogRepository>(
    service: web::Data<CartService<R>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let cart = web::block(move || service.add_item(user.id(), product_id)).await??;
    Ok(HttpResponse::Created().json(CartResponse::from(cart)))
}

/// PATCH /products/{id}/shopping_cart/
///
/// Takes one unit away. The last unit can only be removed with DELETE.
#[utoipa::path(
    patch,
    path = "/products/{id}/shopping_cart/",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Quantity decreased", body = CartResponse),
        (status = 400, description = "Only one unit left"),
        (status = 404, description = "Product is not in the cart"),
    ),
    tag = "cart"
)]
pub async fn decrement_item<R: CartRepository + CatalogRepository>(
    service: web::Data<CartService<R>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let cart = web::block(move || service.decrement_item(user.id(), product_id)).await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// DELETE /products/{id}/shopping_cart/
#[utoipa::path(
    delete,
    path = "/products/{id}/shopping_cart/",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Line removed", body = CartResponse),
        (status = 404, description = "Product is not in the cart"),
    ),
    tag = "cart"
)]
pub async fn remove_item<R: CartRepository + CatalogRepository>(
    service: web::Data<CartService<R>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let cart = web::block(move || service.remove_item(user.id(), product_id)).await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// PATCH /products/{id}/select/
#[utoipa::path(
    patch,
    path = "/products/{id}/select/",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Selection flipped", body = CartResponse),
        (status = 404, description = "Product is not in the cart"),
    ),
    tag = "cart"
)]
pub async fn toggle_selected<R: CartRepository + CatalogRepository>(
    service: web::Data<CartService<R>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let cart = web::block(move || service.toggle_selected(user.id(), product_id)).await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// PATCH /select_all/
#[utoipa::path(
    patch,
    path = "/select_all/",
    responses((status = 200, description = "Every line selected", body = CartResponse)),
    tag = "cart"
)]
pub async fn select_all<R: CartRepository + CatalogRepository>(
    service: web::Data<CartService<R>>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let cart = web::block(move || service.select_all(user.id())).await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// DELETE /select_all/
#[utoipa::path(
    delete,
    path = "/select_all/",
    responses((status = 200, description = "Every line deselected", body = CartResponse)),
    tag = "cart"
)]
pub async fn deselect_all<R: CartRepository + CatalogRepository>(
    service: web::Data<CartService<R>>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let cart = web::block(move || service.deselect_all(user.id())).await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// DELETE /delete_all_selected/
///
/// Responds 204 when nothing is left in the cart.
#[utoipa::path(
    delete,
    path = "/delete_all_selected/",
    responses(
        (status = 200, description = "Selected lines deleted", body = CartResponse),
        (status = 204, description = "Cart is now empty"),
    ),
    tag = "cart"
)]
pub async fn delete_selected<R: CartRepository + CatalogRepository>(
    service: web::Data<CartService<R>>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let cart = web::block(move || service.delete_selected(user.id())).await??;
    if cart.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}
