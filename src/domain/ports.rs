use uuid::Uuid;

use super::cart::{CartSnapshot, DiscountPercent};
use super::catalog::{PriceRange, Product};
use super::errors::DomainError;
use super::order::{CheckoutCommand, CheckoutPolicy, ListResult, OrderView};

pub trait CatalogRepository: Send + Sync + 'static {
    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn price_range(&self) -> Result<PriceRange, DomainError>;
}

/// Per-user cart storage. Every method is scoped to `user_id`'s own cart and
/// reports `NotFound` for lines that are not in it.
pub trait CartRepository: Send + Sync + 'static {
    fn snapshot(&self, user_id: Uuid) -> Result<CartSnapshot, DomainError>;
    /// Creates the cart and the line on first use, otherwise adds one unit.
    fn add_item(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError>;
    fn decrement_item(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError>;
    fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError>;
    fn toggle_selected(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError>;
    fn set_all_selected(&self, user_id: Uuid, selected: bool) -> Result<(), DomainError>;
    /// Returns the number of lines deleted.
    fn delete_selected(&self, user_id: Uuid) -> Result<usize, DomainError>;
    fn set_discount(&self, user_id: Uuid, discount: DiscountPercent) -> Result<(), DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Turns the selected cart lines into an order in one transaction.
    fn checkout(
        &self,
        user_id: Uuid,
        command: &CheckoutCommand,
        policy: &CheckoutPolicy,
    ) -> Result<OrderView, DomainError>;
    fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list(&self, user_id: Uuid, page: i64, limit: i64) -> Result<ListResult, DomainError>;
    fn mark_paid(&self, user_id: Uuid, id: Uuid) -> Result<OrderView, DomainError>;
    fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DomainError>;
}
