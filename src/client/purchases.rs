use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{endpoints, ApiConnector};
use crate::{auth::AccessToken, errors::ServiceError};

/// Enrollment request sent once the gateway has settled the amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub courses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub receipt_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BundleAccessBody<'a> {
    course_ids: &'a [String],
}

/// Downstream purchase collaborators.
#[async_trait]
pub trait PurchaseApi: Send + Sync {
    /// Enrolls the user into paid courses after payment settled.
    async fn complete_purchase(
        &self,
        token: &AccessToken,
        request: PurchaseRequest,
    ) -> Result<(), ServiceError>;

    /// Requests access to free courses of a bundle.
    async fn request_bundle_access(
        &self,
        token: &AccessToken,
        course_ids: Vec<String>,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone)]
pub struct HttpPurchaseApi {
    connector: ApiConnector,
}

impl HttpPurchaseApi {
    pub fn new(connector: ApiConnector) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl PurchaseApi for HttpPurchaseApi {
    #[instrument(skip(self, token, request), fields(courses = request.courses.len(), receipt_id = %request.receipt_id))]
    async fn complete_purchase(
        &self,
        token: &AccessToken,
        request: PurchaseRequest,
    ) -> Result<(), ServiceError> {
        let envelope = self
            .connector
            .post::<_, serde_json::Value>(endpoints::PURCHASE_ENROLL, &request, Some(token))
            .await?;

        if !envelope.success {
            return Err(ServiceError::PaymentFailed(
                envelope
                    .message()
                    .unwrap_or("Could not complete enrollment")
                    .to_string(),
            ));
        }

        info!("enrollment completed");
        Ok(())
    }

    #[instrument(skip(self, token), fields(courses = course_ids.len()))]
    async fn request_bundle_access(
        &self,
        token: &AccessToken,
        course_ids: Vec<String>,
    ) -> Result<(), ServiceError> {
        let envelope = self
            .connector
            .post::<_, serde_json::Value>(
                endpoints::BUNDLE_REQUEST_ACCESS,
                &BundleAccessBody {
                    course_ids: &course_ids,
                },
                Some(token),
            )
            .await?;

        if !envelope.success {
            return Err(ServiceError::ExternalApiError(
                envelope
                    .message()
                    .unwrap_or("bundle access request failed")
                    .to_string(),
            ));
        }

        info!("bundle access requested");
        Ok(())
    }
}
