//! REST boundary to the marketplace backend.
//!
//! `ApiConnector` is a thin wrapper over `reqwest` that knows the base URL,
//! attaches the bearer token and unwraps the `{ success, data, message }`
//! envelope. The capability traits in [`coupons`] and [`purchases`] are what
//! the checkout services depend on.

pub mod coupons;
pub mod purchases;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
    auth::AccessToken,
    config::ClientConfig,
    errors::{ErrorResponse, ServiceError},
};

pub use coupons::{CouponApi, HttpCouponApi};
pub use purchases::{HttpPurchaseApi, PurchaseApi, PurchaseRequest};

/// Endpoint paths relative to the configured base URL.
pub mod endpoints {
    pub const VALIDATE_AND_APPLY_COUPON: &str = "coupon/validate-and-apply";
    pub const FRONTEND_COUPONS: &str = "coupon/frontend";
    pub const BUNDLE_REQUEST_ACCESS: &str = "bundle/request-access";
    pub const PURCHASE_ENROLL: &str = "payment/enroll";
}

/// Response envelope used by every backend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ApiConnector {
    client: Client,
    base_url: Url,
}

impl ApiConnector {
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("coursemart-checkout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::ConfigError(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&config.api_base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// POSTs a JSON body and returns the decoded envelope of a 2xx response.
    ///
    /// Non-2xx responses are classified into a `ServiceError` from the status
    /// code and whatever error body the backend sent.
    #[instrument(skip(self, body, token), fields(authenticated = token.is_some()))]
    pub async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&AccessToken>,
    ) -> Result<ApiEnvelope<T>, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let mut request = self.client.post(url).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = bytes.len(), "backend responded");

        if !status.is_success() {
            let error_body = serde_json::from_slice::<ErrorResponse>(&bytes).ok();
            let err = ServiceError::from_status(status, error_body.as_ref());
            warn!(status = status.as_u16(), error = %err, "backend request failed");
            return Err(err);
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// `Url::join` replaces the last segment unless the base ends with a slash.
fn normalize_base_url(raw: &str) -> Result<Url, ServiceError> {
    let mut base = raw.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(Url::parse(&base)?)
}
