use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use super::cart::{CartSnapshot, DiscountPercent};
use super::errors::DomainError;

pub const EMPTY_CART: &str = "Ваша корзина пуста.";
pub const MISSING_PAY_METHOD: &str = "Укажите метод оплаты заказа.";
pub const INVALID_PAY_METHOD: &str = "Недопустимый метод оплаты заказа.";
pub const INVALID_EMAIL: &str = "Введите правильный адрес электронной почты.";
pub const UNPAID_ORDER_PENDING: &str =
    "У вас уже есть неоплаченный заказ, оплатите или удалите его.";
pub const PAID_ORDER_UNDELETABLE: &str = "Нельзя удалить оплаченный заказ.";

const SEND_TO_MAX_LEN: usize = 200;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayMethod {
    Card,
    Sbp,
}

impl PayMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PayMethod::Card => "card",
            PayMethod::Sbp => "sbp",
        }
    }
}

impl fmt::Display for PayMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PayMethod::Card),
            "sbp" => Ok(PayMethod::Sbp),
            _ => Err(DomainError::validation("pay_method", INVALID_PAY_METHOD)),
        }
    }
}

/// Checkout input exactly as the client sent it.
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    pub pay_method: Option<String>,
    pub send_to: Option<String>,
}

/// Checkout input after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCommand {
    pub pay_method: PayMethod,
    pub send_to: String,
}

impl CheckoutCommand {
    /// Validates the payment method first, then the recipient. A missing or
    /// blank recipient falls back to `account_email`.
    pub fn validate(request: CheckoutRequest, account_email: &str) -> Result<Self, DomainError> {
        let pay_method = match request.pay_method.as_deref() {
            None | Some("") => {
                return Err(DomainError::validation("pay_method", MISSING_PAY_METHOD));
            }
            Some(raw) => raw.parse::<PayMethod>()?,
        };

        let send_to = match request.send_to.as_deref().map(str::trim) {
            None | Some("") => account_email.trim().to_string(),
            Some(explicit) => explicit.to_string(),
        };
        if !is_valid_email(&send_to) {
            return Err(DomainError::validation("send_to", INVALID_EMAIL));
        }

        Ok(Self {
            pay_method,
            send_to,
        })
    }
}

pub fn is_valid_email(candidate: &str) -> bool {
    candidate.len() <= SEND_TO_MAX_LEN && EMAIL_PATTERN.is_match(candidate)
}

/// Knobs of the checkout transition that come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutPolicy {
    /// Number given to the very first order.
    pub first_order_number: i64,
    /// Refuse checkout while the user still has an unpaid order.
    pub single_unpaid_order: bool,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            first_order_number: 1,
            single_unpaid_order: false,
        }
    }
}

pub fn next_order_number(current_max: Option<i64>, first_order_number: i64) -> i64 {
    match current_max {
        Some(max) => max.saturating_add(1).max(first_order_number),
        None => first_order_number,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineDraft {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i32,
}

/// Everything checkout will write, computed from one consistent read of the
/// cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub total_cost: i64,
    pub discount: Option<DiscountPercent>,
    pub lines: Vec<OrderLineDraft>,
}

impl CheckoutPlan {
    pub fn from_cart(cart: &CartSnapshot) -> Result<Self, DomainError> {
        let lines: Vec<OrderLineDraft> = cart
            .selected()
            .map(|line| OrderLineDraft {
                product_id: line.product_id,
                product_name: line.name.clone(),
                unit_price: line.price,
                quantity: line.quantity,
            })
            .collect();

        if lines.is_empty() {
            return Err(DomainError::validation("errors", EMPTY_CART));
        }

        Ok(Self {
            total_cost: cart.discounted_cost(),
            discount: cart.discount,
            lines,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineView {
    pub id: Uuid,
    /// `None` once the product has been removed from the catalog.
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i32,
}

impl OrderLineView {
    pub fn cost(&self) -> i64 {
        self.unit_price.saturating_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub number_order: i64,
    pub pay_method: String,
    pub send_to: String,
    pub total_cost: i64,
    pub discount: Option<DiscountPercent>,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
}

impl OrderView {
    pub fn ensure_deletable(&self) -> Result<(), DomainError> {
        if self.is_paid {
            Err(DomainError::policy(PAID_ORDER_UNDELETABLE))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}
