//! Process configuration read from the environment (and `.env`, when present).

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::cart::DiscountPercent;
use crate::domain::order::CheckoutPolicy;
use crate::domain::promo::PromoLedger;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("PROMO_CODES entry {0:?} must look like CODE=PERCENT with a percent in 0..=100")]
    InvalidPromoCode(String),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pool_size: u32,
    pub checkout: CheckoutPolicy,
    pub promos: PromoLedger,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let lookup = |name: &str| vars.get(name).map(String::as_str);

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?
            .to_string();

        let promos = match lookup("PROMO_CODES") {
            Some(raw) => parse_promo_codes(raw)?,
            None => PromoLedger::default(),
        };

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or("0.0.0.0").to_string(),
            port: parse_or(lookup("PORT"), "PORT", 8080)?,
            pool_size: parse_or(lookup("DATABASE_POOL_SIZE"), "DATABASE_POOL_SIZE", 10)?,
            checkout: CheckoutPolicy {
                first_order_number: parse_or(
                    lookup("FIRST_ORDER_NUMBER"),
                    "FIRST_ORDER_NUMBER",
                    CheckoutPolicy::default().first_order_number,
                )?,
                single_unpaid_order: parse_or(
                    lookup("SINGLE_UNPAID_ORDER"),
                    "SINGLE_UNPAID_ORDER",
                    false,
                )?,
            },
            promos,
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<&str>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}

/// Parses `CODE=PERCENT` pairs separated by commas, e.g. `SPRING=15,VIP=30`.
pub fn parse_promo_codes(raw: &str) -> Result<PromoLedger, ConfigError> {
    let mut codes = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let invalid = || ConfigError::InvalidPromoCode(entry.to_string());
        let (code, percent) = entry.split_once('=').ok_or_else(invalid)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(invalid());
        }
        let percent = percent
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DiscountPercent::new)
            .ok_or_else(invalid)?;
        codes.push((code.to_string(), percent));
    }
    Ok(PromoLedger::new(codes))
}
