use std::collections::HashMap;

use super::cart::DiscountPercent;
use super::errors::DomainError;

pub const INVALID_PROMO_CODE: &str = "Некорректный промокод";

/// Read-only table of promo codes and the discount each one grants.
///
/// Codes match exactly and case-sensitively. There is no expiry and no
/// per-user redemption limit; applying a second code replaces the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoLedger {
    codes: HashMap<String, DiscountPercent>,
}

impl PromoLedger {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = (S, DiscountPercent)>,
        S: Into<String>,
    {
        Self {
            codes: codes
                .into_iter()
                .map(|(code, percent)| (code.into(), percent))
                .collect(),
        }
    }

    pub fn lookup(&self, code: &str) -> Result<DiscountPercent, DomainError> {
        self.codes
            .get(code)
            .copied()
            .ok_or_else(|| DomainError::validation("promocode", INVALID_PROMO_CODE))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for PromoLedger {
    fn default() -> Self {
        let codes = [("PROMO10", 10), ("PROMO20", 20), ("PROMO30", 30)]
            .into_iter()
            .filter_map(|(code, pct)| DiscountPercent::new(pct).map(|p| (code, p)));
        Self::new(codes)
    }
}
