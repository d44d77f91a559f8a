use std::fmt;

use uuid::Uuid;

use super::catalog::CategoryRef;
use super::errors::DomainError;

/// A whole-number discount between 0 and 100 percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiscountPercent(u8);

impl DiscountPercent {
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Applies the discount, rounding the discounted total down.
    pub fn apply(self, total: i64) -> i64 {
        let keep = i64::from(Self::MAX - self.0);
        total.saturating_mul(keep).div_euclid(100)
    }
}

impl fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub selected: bool,
    pub in_favorite: bool,
    pub category: CategoryRef,
}

impl CartLine {
    pub fn cost(&self) -> i64 {
        self.price.saturating_mul(i64::from(self.quantity))
    }
}

/// Quantity after taking one unit away. A line never goes below one unit
/// this way; the caller has to remove it instead.
pub fn decrement_quantity(quantity: i32, product_name: &str) -> Result<i32, DomainError> {
    if quantity > 1 {
        Ok(quantity - 1)
    } else {
        Err(DomainError::policy(format!(
            "Нельзя удалить товар {product_name} данным способом."
        )))
    }
}

/// Point-in-time view of a user's cart. `id` is `None` until the first
/// mutation creates the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    pub id: Option<Uuid>,
    pub discount: Option<DiscountPercent>,
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    pub fn selected(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|line| line.selected)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_cost(&self) -> i64 {
        self.selected()
            .fold(0_i64, |acc, line| acc.saturating_add(line.cost()))
    }

    pub fn total_quantity(&self) -> i64 {
        self.selected()
            .fold(0_i64, |acc, line| acc.saturating_add(i64::from(line.quantity)))
    }

    pub fn discounted_cost(&self) -> i64 {
        discounted_cost(self.total_cost(), self.discount)
    }
}

pub fn discounted_cost(total_cost: i64, discount: Option<DiscountPercent>) -> i64 {
    match discount {
        Some(discount) => discount.apply(total_cost),
        None => total_cost,
    }
}
