use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::notifications::ToastKind;

/// Fallback shown when the backend rejects a coupon without a message.
pub const GENERIC_COUPON_ERROR: &str = "Invalid or expired coupon";
/// Fallback shown for transport and server failures.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again";

/// Error body returned by the marketplace backend on non-success responses.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// The most specific human-readable message the backend provided.
    pub fn message(&self) -> Option<&str> {
        nonblank(&self.message).or_else(|| nonblank(&self.error))
    }
}

fn nonblank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|m| !m.is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Coupon rejected: {0}")]
    CouponRejected(String),

    #[error("Coupon not applicable: {0}")]
    CouponTypeMismatch(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::SerializationError(err.to_string())
        } else if let Some(status) = err.status() {
            ServiceError::from_status(status, None)
        } else {
            ServiceError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl From<url::ParseError> for ServiceError {
    fn from(err: url::ParseError) -> Self {
        ServiceError::ConfigError(format!("invalid endpoint url: {}", err))
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl ServiceError {
    /// Classifies a non-success backend response.
    ///
    /// Rate limiting and auth failures are recognised from the status code;
    /// checkout-type mismatches can only be told apart by the message text.
    pub fn from_status(status: StatusCode, body: Option<&ErrorResponse>) -> Self {
        let message = body.and_then(ErrorResponse::message);

        if status == StatusCode::TOO_MANY_REQUESTS || message.is_some_and(is_rate_limit_message) {
            return ServiceError::RateLimitExceeded;
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Unauthorized(
                message.unwrap_or("Session expired, please log in again").to_string(),
            ),
            s if s.is_client_error() => ServiceError::rejected(message),
            s if s.is_server_error() => ServiceError::ExternalServiceError(
                message
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("backend returned {}", s)),
            ),
            s => ServiceError::ExternalApiError(format!("unexpected status {}", s)),
        }
    }

    /// Builds the rejection for a coupon the backend refused, telling a
    /// checkout-type mismatch apart from a generic invalid coupon.
    pub fn rejected(message: Option<&str>) -> Self {
        match message {
            Some(msg) if is_rate_limit_message(msg) => ServiceError::RateLimitExceeded,
            Some(msg) if is_type_mismatch_message(msg) => {
                ServiceError::CouponTypeMismatch(msg.to_string())
            }
            Some(msg) => ServiceError::CouponRejected(msg.to_string()),
            None => ServiceError::CouponRejected(GENERIC_COUPON_ERROR.to_string()),
        }
    }

    /// Text shown to the user in a toast.
    /// Internal failures get a generic message to avoid leaking details.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthRequired => "Please log in to apply a coupon".to_string(),
            Self::Unauthorized(msg)
            | Self::CouponRejected(msg)
            | Self::CouponTypeMismatch(msg)
            | Self::InvalidInput(msg)
            | Self::InvalidOperation(msg)
            | Self::PaymentFailed(msg) => msg.clone(),
            Self::RateLimitExceeded => {
                "Too many attempts. Please wait a moment and try again".to_string()
            }
            Self::NetworkError(_)
            | Self::ExternalServiceError(_)
            | Self::ExternalApiError(_)
            | Self::SerializationError(_)
            | Self::ConfigError(_) => GENERIC_FAILURE.to_string(),
        }
    }

    pub fn toast_kind(&self) -> ToastKind {
        match self {
            Self::RateLimitExceeded | Self::AuthRequired => ToastKind::Warning,
            _ => ToastKind::Error,
        }
    }

    /// Whether the user can simply try again later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::NetworkError(_) | Self::ExternalServiceError(_)
        )
    }
}

fn is_rate_limit_message(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("too many") || lower.contains("rate limit")
}

fn is_type_mismatch_message(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("not applicable")
        || lower.contains("only valid for")
        || lower.contains("checkout type")
        || lower.contains("cannot be used for")
}
