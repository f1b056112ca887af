use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::CheckoutType;

/// Body of the validate-and-apply request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub checkout_type: CheckoutType,
}

/// `data` payload of a successful validate-and-apply response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponQuote {
    pub discount_amount: Decimal,
    #[serde(default)]
    pub final_amount: Option<Decimal>,
}

/// Coupon discount held by a checkout screen for the current session only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    pub code: String,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

impl AppliedDiscount {
    /// Final amount is recomputed locally as `max(0, total - discount)`.
    pub fn new(code: impl Into<String>, total_amount: Decimal, discount_amount: Decimal) -> Self {
        Self {
            code: code.into(),
            discount_amount,
            final_amount: (total_amount - discount_amount).max(Decimal::ZERO),
        }
    }
}
