// Checkout flow
pub mod checkout;
pub mod coupon_input;

// Pricing and settlement
pub mod payments;
pub mod pricing;

// Documents
pub mod invoicing;

pub use checkout::{CheckoutItems, CheckoutSession, PriceSummary, PurchaseOutcome, PurchaseService};
pub use coupon_input::{CouponInput, CouponInputState};
pub use invoicing::{Invoice, InvoiceLine};
pub use payments::{PaymentError, PaymentGateway, Receipt, ZeroAmountGateway};
pub use pricing::PricingBreakdown;
