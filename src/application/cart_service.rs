use std::sync::Arc;

use log::{debug, info};
use uuid::Uuid;

use crate::domain::cart::CartSnapshot;
use crate::domain::errors::{DomainError, Resource};
use crate::domain::ports::{CartRepository, CatalogRepository};
use crate::domain::promo::PromoLedger;

/// Cart mutations. Each one returns the cart as it looks afterwards.
pub struct CartService<R> {
    repo: Arc<R>,
    promos: PromoLedger,
}

impl<R: CartRepository + CatalogRepository> CartService<R> {
    pub fn new(repo: Arc<R>, promos: PromoLedger) -> Self {
        Self { repo, promos }
    }

    pub fn get_cart(&self, user_id: Uuid) -> Result<CartSnapshot, DomainError> {
        self.repo.snapshot(user_id)
    }

    pub fn add_item(&self, user_id: Uuid, product_id: Uuid) -> Result<CartSnapshot, DomainError> {
        if self.repo.find_product(product_id)?.is_none() {
            return Err(DomainError::NotFound(Resource::Product));
        }
        self.repo.add_item(user_id, product_id)?;
        debug!("user {user_id} added product {product_id} to cart");
        self.repo.snapshot(user_id)
    }

    pub fn decrement_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<CartSnapshot, DomainError> {
        self.repo.decrement_item(user_id, product_id)?;
        self.repo.snapshot(user_id)
    }

    pub fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<CartSnapshot, DomainError> {
        self.repo.remove_item(user_id, product_id)?;
        debug!("user {user_id} removed product {product_id} from cart");
        self.repo.snapshot(user_id)
    }

    pub fn toggle_selected(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<CartSnapshot, DomainError> {
        self.repo.toggle_selected(user_id, product_id)?;
        self.repo.snapshot(user_id)
    }

    pub fn select_all(&self, user_id: Uuid) -> Result<CartSnapshot, DomainError> {
        self.repo.set_all_selected(user_id, true)?;
        self.repo.snapshot(user_id)
    }

    pub fn deselect_all(&self, user_id: Uuid) -> Result<CartSnapshot, DomainError> {
        self.repo.set_all_selected(user_id, false)?;
        self.repo.snapshot(user_id)
    }

    pub fn delete_selected(&self, user_id: Uuid) -> Result<CartSnapshot, DomainError> {
        let deleted = self.repo.delete_selected(user_id)?;
        debug!("user {user_id} deleted {deleted} selected cart lines");
        self.repo.snapshot(user_id)
    }

    /// Attaches the discount behind `code`. An unknown code leaves the cart
    /// untouched.
    pub fn apply_promocode(&self, user_id: Uuid, code: &str) -> Result<CartSnapshot, DomainError> {
        let discount = self.promos.lookup(code)?;
        self.repo.set_discount(user_id, discount)?;
        info!("user {user_id} applied promo code {code} ({discount})");
        self.repo.snapshot(user_id)
    }
}
