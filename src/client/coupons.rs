use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{endpoints, ApiConnector};
use crate::{
    auth::AccessToken,
    errors::ServiceError,
    models::{ApplyCouponRequest, CheckoutType, Coupon, CouponQuote},
};

/// Coupon operations the checkout tier relies on.
#[async_trait]
pub trait CouponApi: Send + Sync {
    /// Validates the code server-side and, if accepted, returns the discount
    /// for `request.total_amount`.
    async fn validate_and_apply(
        &self,
        token: &AccessToken,
        request: ApplyCouponRequest,
    ) -> Result<CouponQuote, ServiceError>;

    /// Public listing of coupons offered for a checkout type. Advisory only.
    async fn list_frontend_coupons(
        &self,
        checkout_type: CheckoutType,
    ) -> Result<Vec<Coupon>, ServiceError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListCouponsBody {
    checkout_type: CheckoutType,
}

#[derive(Debug, Clone)]
pub struct HttpCouponApi {
    connector: ApiConnector,
}

impl HttpCouponApi {
    pub fn new(connector: ApiConnector) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl CouponApi for HttpCouponApi {
    #[instrument(skip(self, token), fields(code = %request.code, checkout_type = %request.checkout_type))]
    async fn validate_and_apply(
        &self,
        token: &AccessToken,
        request: ApplyCouponRequest,
    ) -> Result<CouponQuote, ServiceError> {
        request.validate()?;

        let envelope = self
            .connector
            .post::<_, CouponQuote>(endpoints::VALIDATE_AND_APPLY_COUPON, &request, Some(token))
            .await?;

        let quote = match envelope.data {
            Some(ref quote) if envelope.success => quote.clone(),
            _ => return Err(ServiceError::rejected(envelope.message())),
        };

        if quote.discount_amount < Decimal::ZERO {
            warn!(discount = %quote.discount_amount, "backend returned a negative discount");
            return Err(ServiceError::ExternalApiError(format!(
                "negative discount {} for coupon {}",
                quote.discount_amount, request.code
            )));
        }

        info!(discount = %quote.discount_amount, "coupon accepted");
        Ok(quote)
    }

    #[instrument(skip(self))]
    async fn list_frontend_coupons(
        &self,
        checkout_type: CheckoutType,
    ) -> Result<Vec<Coupon>, ServiceError> {
        let envelope = self
            .connector
            .post::<_, Vec<Coupon>>(
                endpoints::FRONTEND_COUPONS,
                &ListCouponsBody { checkout_type },
                None,
            )
            .await?;

        if !envelope.success {
            return Err(ServiceError::ExternalApiError(
                envelope
                    .message()
                    .unwrap_or("coupon listing failed")
                    .to_string(),
            ));
        }

        Ok(envelope.data.unwrap_or_default())
    }
}
