use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Shown when a purchase is attempted with an amount still owed.
pub const PAY_FIRST_MESSAGE: &str = "You have to pay first";

/// Proof that an amount was settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,
    pub amount: Decimal,
    pub provider: String,
    pub issued_at: DateTime<Utc>,
}

impl Receipt {
    /// Receipt for an order whose discounts brought the amount to zero.
    pub fn complimentary() -> Self {
        Self {
            id: Uuid::new_v4(),
            amount: Decimal::ZERO,
            provider: ZeroAmountGateway::PROVIDER.to_string(),
            issued_at: Utc::now(),
        }
    }

    pub fn is_complimentary(&self) -> bool {
        self.amount.is_zero()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PaymentError {
    /// Policy rejection: the gateway does not collect this amount itself.
    #[error("Payment required: {amount}")]
    PaymentRequired { amount: Decimal },

    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment provider error: {0}")]
    Provider(String),
}

impl From<PaymentError> for ServiceError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::PaymentRequired { .. } => {
                ServiceError::PaymentFailed(PAY_FIRST_MESSAGE.to_string())
            }
            PaymentError::Declined(msg) => ServiceError::PaymentFailed(msg),
            PaymentError::Provider(msg) => ServiceError::ExternalServiceError(msg),
        }
    }
}

/// Capability to settle a checkout amount.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, amount: Decimal) -> Result<Receipt, PaymentError>;
}

/// Completes only purchases that discounts brought to exactly zero; any other
/// amount is `PaymentRequired` and must be settled through the payment
/// provider's own checkout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroAmountGateway;

impl ZeroAmountGateway {
    pub const PROVIDER: &'static str = "complimentary";
}

#[async_trait]
impl PaymentGateway for ZeroAmountGateway {
    #[instrument(skip(self))]
    async fn charge(&self, amount: Decimal) -> Result<Receipt, PaymentError> {
        if amount.is_zero() {
            let receipt = Receipt::complimentary();
            info!(receipt_id = %receipt.id, "zero amount settled without payment");
            Ok(receipt)
        } else {
            Err(PaymentError::PaymentRequired { amount })
        }
    }
}
