//! Bundle pricing primitives.
//!
//! Prices are whole currency units; rounding is half-up to a whole unit.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::Course;

/// Discount for bundles of three or more paid courses.
pub const THREE_COURSE_DISCOUNT: Decimal = dec!(0.15);
/// Discount for bundles of exactly two paid courses.
pub const TWO_COURSE_DISCOUNT: Decimal = dec!(0.10);

/// Sum of prices, free courses contributing nothing.
pub fn original_price(courses: &[Course]) -> Decimal {
    courses.iter().map(Course::payable_price).sum()
}

pub fn paid_course_count(courses: &[Course]) -> usize {
    courses.iter().filter(|c| !c.is_free()).count()
}

/// Tiered step schedule, not interpolated.
pub fn bundle_discount_fraction(course_count: usize) -> Decimal {
    match course_count {
        n if n >= 3 => THREE_COURSE_DISCOUNT,
        2 => TWO_COURSE_DISCOUNT,
        _ => Decimal::ZERO,
    }
}

/// Original price less the tier discount earned by the paid courses.
pub fn bundle_price(courses: &[Course]) -> Decimal {
    let fraction = bundle_discount_fraction(paid_course_count(courses));
    round_currency(original_price(courses) * (Decimal::ONE - fraction))
}

pub fn savings(courses: &[Course]) -> Decimal {
    original_price(courses) - bundle_price(courses)
}

/// `max(0, base - coupon_discount)`.
pub fn final_amount(base_price: Decimal, coupon_discount: Decimal) -> Decimal {
    (base_price - coupon_discount).max(Decimal::ZERO)
}

/// Round half-up to whole currency units.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Everything a bundle checkout shows about its price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub original_price: Decimal,
    pub discount_fraction: Decimal,
    pub bundle_price: Decimal,
    pub savings: Decimal,
}

impl PricingBreakdown {
    pub fn for_bundle(courses: &[Course]) -> Self {
        let original = original_price(courses);
        let price = bundle_price(courses);
        Self {
            original_price: original,
            discount_fraction: bundle_discount_fraction(paid_course_count(courses)),
            bundle_price: price,
            savings: original - price,
        }
    }

    /// Discount as a whole percentage, e.g. `15` for `0.15`.
    pub fn discount_percent(&self) -> Decimal {
        (self.discount_fraction * Decimal::ONE_HUNDRED).normalize()
    }
}
