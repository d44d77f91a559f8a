pub mod cart;
pub mod catalog;
pub mod orders;

use std::sync::Arc;

use actix_web::web;
use utoipa::OpenApi;

use crate::application::{CartService, CatalogService, OrderService};
use crate::domain::order::CheckoutPolicy;
use crate::domain::ports::{CartRepository, CatalogRepository, OrderRepository};
use crate::domain::promo::PromoLedger;
use crate::errors::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        cart::get_cart,
        cart::apply_promocode,
        cart::add_item,
        cart::decrement_item,
        cart::remove_item,
        cart::toggle_selected,
        cart::select_all,
        cart::deselect_all,
        cart::delete_selected,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::mark_paid,
        orders::delete_order,
        catalog::price_range,
    ),
    components(schemas(
        cart::PromocodeRequest,
        cart::CategoryResponse,
        cart::CartItemResponse,
        cart::CartResponse,
        orders::CreateOrderRequest,
        orders::OrderLineResponse,
        orders::OrderResponse,
        orders::ListOrdersResponse,
        catalog::PriceRangeResponse,
    )),
    tags(
        (name = "cart", description = "Shopping cart and promo codes"),
        (name = "orders", description = "Checkout and order history"),
        (name = "catalog", description = "Catalog lookups"),
    )
)]
pub struct ApiDoc;

/// Application services shared by every worker.
pub struct AppServices<R> {
    carts: web::Data<CartService<R>>,
    orders: web::Data<OrderService<R>>,
    catalog: web::Data<CatalogService<R>>,
}

impl<R> Clone for AppServices<R> {
    fn clone(&self) -> Self {
        Self {
            carts: self.carts.clone(),
            orders: self.orders.clone(),
            catalog: self.catalog.clone(),
        }
    }
}

impl<R> AppServices<R>
where
    R: CartRepository + CatalogRepository + OrderRepository,
{
    pub fn new(repo: Arc<R>, promos: PromoLedger, policy: CheckoutPolicy) -> Self {
        Self {
            carts: web::Data::new(CartService::new(repo.clone(), promos)),
            orders: web::Data::new(OrderService::new(repo.clone(), policy)),
            catalog: web::Data::new(CatalogService::new(repo)),
        }
    }
}

/// Malformed JSON bodies are reported in the same shape as validation errors.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation {
            field: "errors".to_string(),
            message: err.to_string(),
        }
        .into()
    })
}

pub fn configure<R>(cfg: &mut web::ServiceConfig, services: &AppServices<R>)
where
    R: CartRepository + CatalogRepository + OrderRepository,
{
    cfg.app_data(services.carts.clone())
        .app_data(services.orders.clone())
        .app_data(services.catalog.clone())
        .app_data(json_config())
        .service(web::resource("/cart/").route(web::get().to(cart::get_cart::<R>)))
        .service(
            web::resource("/cart/promocode/").route(web::post().to(cart::apply_promocode::<R>)),
        )
        .service(
            web::resource("/products/{id}/shopping_cart/")
                .route(web::post().to(cart::add_item::<R>))
                .route(web::patch().to(cart::decrement_item::<R>))
                .route(web::delete().to(cart::remove_item::<R>)),
        )
        .service(
            web::resource("/products/{id}/select/")
                .route(web::patch().to(cart::toggle_selected::<R>)),
        )
        .service(
            web::resource("/select_all/")
                .route(web::patch().to(cart::select_all::<R>))
                .route(web::delete().to(cart::deselect_all::<R>)),
        )
        .service(
            web::resource("/delete_all_selected/")
                .route(web::delete().to(cart::delete_selected::<R>)),
        )
        .service(
            web::resource("/orders/")
                .route(web::get().to(orders::list_orders::<R>))
                .route(web::post().to(orders::create_order::<R>)),
        )
        .service(
            web::resource("/orders/{id}/")
                .route(web::get().to(orders::get_order::<R>))
                .route(web::delete().to(orders::delete_order::<R>)),
        )
        .service(
            web::resource("/orders/{id}/is_paid/")
                .route(web::patch().to(orders::mark_paid::<R>)),
        )
        .service(
            web::resource("/get_min_max_cost/").route(web::get().to(catalog::price_range::<R>)),
        );
}
