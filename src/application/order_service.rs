use std::sync::Arc;

use log::{info, warn};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{CheckoutCommand, CheckoutPolicy, CheckoutRequest, ListResult, OrderView};
use crate::domain::ports::OrderRepository;
use crate::domain::user::UserIdentity;

pub struct OrderService<R> {
    repo: Arc<R>,
    policy: CheckoutPolicy,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: Arc<R>, policy: CheckoutPolicy) -> Self {
        Self { repo, policy }
    }

    /// Validates the request, then hands the cart to the repository for the
    /// transactional part of checkout.
    pub fn create_order(
        &self,
        user: &UserIdentity,
        request: CheckoutRequest,
    ) -> Result<OrderView, DomainError> {
        let command = CheckoutCommand::validate(request, &user.email)?;
        match self.repo.checkout(user.id, &command, &self.policy) {
            Ok(order) => {
                info!(
                    "order #{} created for user {} ({} lines, total {})",
                    order.number_order,
                    user.id,
                    order.lines.len(),
                    order.total_cost
                );
                Ok(order)
            }
            Err(e) => {
                if !matches!(e, DomainError::Internal(_)) {
                    warn!("checkout rejected for user {}: {}", user.id, e);
                }
                Err(e)
            }
        }
    }

    pub fn get_order(&self, user_id: Uuid, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        self.repo.find_by_id(user_id, id)
    }

    /// `page` is 1-based; callers bound `limit`.
    pub fn list_orders(&self, user_id: Uuid, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        self.repo.list(user_id, page, limit)
    }

    /// Idempotent: an already paid order is returned as is.
    pub fn mark_paid(&self, user_id: Uuid, id: Uuid) -> Result<OrderView, DomainError> {
        let order = self.repo.mark_paid(user_id, id)?;
        info!("order #{} marked paid", order.number_order);
        Ok(order)
    }

    pub fn delete_order(&self, user_id: Uuid, id: Uuid) -> Result<(), DomainError> {
        self.repo.delete(user_id, id)?;
        info!("order {id} deleted by user {user_id}");
        Ok(())
    }
}
