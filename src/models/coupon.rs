use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

use super::CheckoutType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Flat,
}

/// Badge shown next to a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CouponStatus {
    Active,
    Inactive,
    Scheduled,
    Expired,
    Exhausted,
}

/// A coupon as returned by the frontend listing endpoint.
///
/// The client only reads these for display. Whether a coupon actually grants
/// a discount is always decided by the validate-and-apply call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "uppercase_code")]
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    /// 0 means no minimum.
    #[serde(default)]
    pub minimum_order_amount: Decimal,
    /// Percentage coupons only; 0 means unlimited.
    #[serde(default)]
    pub max_discount_amount: Decimal,
    /// 0 means unlimited.
    #[serde(default)]
    pub usage_limit: u32,
    /// 0 means unlimited.
    #[serde(default)]
    pub per_user_limit: u32,
    #[serde(default)]
    pub used_count: u32,
    pub start_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub linked_to: CheckoutType,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub is_combinable: bool,
}

fn default_true() -> bool {
    true
}

fn uppercase_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let code = String::deserialize(deserializer)?;
    Ok(code.trim().to_uppercase())
}

impl Coupon {
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.expiry_date
    }

    pub fn is_exhausted(&self) -> bool {
        self.usage_limit > 0 && self.used_count >= self.usage_limit
    }

    /// Uses left before the total usage limit is hit, `None` when unlimited.
    pub fn remaining_uses(&self) -> Option<u32> {
        (self.usage_limit > 0).then(|| self.usage_limit.saturating_sub(self.used_count))
    }

    /// Active toggle, validity window and checkout type all line up.
    pub fn is_currently_usable(&self, checkout_type: CheckoutType, now: DateTime<Utc>) -> bool {
        self.is_active && self.is_within_window(now) && self.linked_to == checkout_type
    }

    pub fn status(&self, now: DateTime<Utc>) -> CouponStatus {
        if !self.is_active {
            CouponStatus::Inactive
        } else if now < self.start_date {
            CouponStatus::Scheduled
        } else if now > self.expiry_date {
            CouponStatus::Expired
        } else if self.is_exhausted() {
            CouponStatus::Exhausted
        } else {
            CouponStatus::Active
        }
    }

    /// One-line offer label, e.g. `20% off (up to ₹500) on orders above ₹999`.
    pub fn summary(&self, currency_symbol: &str) -> String {
        let mut label = match self.discount_type {
            DiscountType::Percentage => {
                let mut s = format!("{}% off", self.discount_value.normalize());
                if self.max_discount_amount > Decimal::ZERO {
                    s.push_str(&format!(
                        " (up to {})",
                        format_amount(currency_symbol, self.max_discount_amount)
                    ));
                }
                s
            }
            DiscountType::Flat => format!(
                "{} off",
                format_amount(currency_symbol, self.discount_value)
            ),
        };

        if self.minimum_order_amount > Decimal::ZERO {
            label.push_str(&format!(
                " on orders above {}",
                format_amount(currency_symbol, self.minimum_order_amount)
            ));
        }
        label
    }
}

/// Renders an amount with its currency symbol and no trailing zeros.
pub fn format_amount(currency_symbol: &str, amount: Decimal) -> String {
    format!("{}{}", currency_symbol, amount.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn coupon(linked_to: CheckoutType) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: None,
            code: "WELCOME20".into(),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(20),
            minimum_order_amount: Decimal::ZERO,
            max_discount_amount: Decimal::ZERO,
            usage_limit: 0,
            per_user_limit: 0,
            used_count: 0,
            start_date: now - Duration::days(1),
            expiry_date: now + Duration::days(1),
            is_active: true,
            linked_to,
            priority: 0,
            is_combinable: false,
        }
    }

    #[test]
    fn usable_requires_active_window_and_type() {
        let now = Utc::now();
        let c = coupon(CheckoutType::Course);
        assert!(c.is_currently_usable(CheckoutType::Course, now));
        assert!(!c.is_currently_usable(CheckoutType::Bundle, now));

        let mut inactive = c.clone();
        inactive.is_active = false;
        assert!(!inactive.is_currently_usable(CheckoutType::Course, now));

        assert!(!c.is_currently_usable(CheckoutType::Course, now + Duration::days(2)));
        assert!(!c.is_currently_usable(CheckoutType::Course, now - Duration::days(2)));
    }

    #[test]
    fn status_badges() {
        let now = Utc::now();
        let c = coupon(CheckoutType::Bundle);
        assert_eq!(c.status(now), CouponStatus::Active);
        assert_eq!(c.status(now - Duration::days(3)), CouponStatus::Scheduled);
        assert_eq!(c.status(now + Duration::days(3)), CouponStatus::Expired);

        let mut used_up = c.clone();
        used_up.usage_limit = 5;
        used_up.used_count = 5;
        assert_eq!(used_up.status(now), CouponStatus::Exhausted);
        assert_eq!(used_up.remaining_uses(), Some(0));

        let mut off = c;
        off.is_active = false;
        assert_eq!(off.status(now), CouponStatus::Inactive);
    }

    #[test]
    fn summary_labels() {
        let mut c = coupon(CheckoutType::Course);
        c.max_discount_amount = dec!(500);
        c.minimum_order_amount = dec!(999);
        assert_eq!(c.summary("₹"), "20% off (up to ₹500) on orders above ₹999");

        c.discount_type = DiscountType::Flat;
        c.discount_value = dec!(100.00);
        c.minimum_order_amount = Decimal::ZERO;
        assert_eq!(c.summary("₹"), "₹100 off");
    }

    #[test]
    fn deserializes_and_uppercases_code() {
        let json = r#"{
            "_id": "64f0",
            "code": " save10 ",
            "discountType": "flat",
            "discountValue": 100,
            "minimumOrderAmount": 0,
            "maxDiscountAmount": 0,
            "usageLimit": 0,
            "perUserLimit": 1,
            "usedCount": 3,
            "startDate": "2024-01-01T00:00:00Z",
            "expiryDate": "2099-01-01T00:00:00Z",
            "isActive": true,
            "linkedTo": "bundle",
            "priority": 2,
            "isCombinable": false
        }"#;

        let c: Coupon = serde_json::from_str(json).unwrap();
        assert_eq!(c.code, "SAVE10");
        assert_eq!(c.discount_type, DiscountType::Flat);
        assert_eq!(c.linked_to, CheckoutType::Bundle);
        assert_eq!(c.per_user_limit, 1);
        assert_eq!(c.remaining_uses(), None);
    }
}
