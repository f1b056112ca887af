pub mod coupon;
pub mod course;
pub mod discount;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use coupon::{format_amount, Coupon, CouponStatus, DiscountType};
pub use course::{Course, CourseType, Instructor};
pub use discount::{AppliedDiscount, ApplyCouponRequest, CouponQuote};

/// Which checkout flow is active; also a coupon's `linkedTo` restriction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CheckoutType {
    Course,
    Bundle,
}
