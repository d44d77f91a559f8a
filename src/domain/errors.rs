use std::fmt;

use thiserror::Error;

/// Things a caller can ask for that may not exist (or may not belong to them).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Product,
    Cart,
    CartItem,
    Order,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Product => "Product",
            Resource::Cart => "Cart",
            Resource::CartItem => "Cart item",
            Resource::Order => "Order",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("Policy violation: {0}")]
    PolicyViolation(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn policy(message: impl Into<String>) -> Self {
        DomainError::PolicyViolation(message.into())
    }
}
