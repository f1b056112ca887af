//! HTTP boundary tests for the coupon and purchase clients.
//!
//! Tests cover:
//! - Validate-and-apply request shape and bearer auth
//! - Rejections, checkout-type mismatches and rate limiting
//! - Frontend coupon listing and linkedTo filtering
//! - Enrollment and bundle access requests

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use coursemart_checkout::{
    auth::{AccessToken, AuthSession},
    client::{ApiConnector, CouponApi, HttpCouponApi, HttpPurchaseApi, PurchaseApi, PurchaseRequest},
    config::ClientConfig,
    errors::ServiceError,
    models::{ApplyCouponRequest, CheckoutType},
    notifications::{ToastKind, ToastQueue},
    services::{CouponInput, CouponInputState},
};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn connector(server: &MockServer) -> ApiConnector {
    ApiConnector::new(&ClientConfig::with_base_url(format!("{}/api", server.uri())))
        .expect("connector")
}

fn token() -> AccessToken {
    AccessToken::new("test-jwt").expect("token")
}

fn listed_coupon(code: &str, linked_to: &str) -> serde_json::Value {
    json!({
        "_id": format!("id-{}", code),
        "code": code,
        "discountType": "flat",
        "discountValue": 100,
        "startDate": (Utc::now() - Duration::days(1)).to_rfc3339(),
        "expiryDate": (Utc::now() + Duration::days(7)).to_rfc3339(),
        "isActive": true,
        "linkedTo": linked_to,
    })
}

// ==================== Validate and apply ====================

#[tokio::test]
async fn validate_and_apply_sends_token_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupon/validate-and-apply"))
        .and(header("authorization", "Bearer test-jwt"))
        .and(body_json(json!({
            "code": "FLAT100",
            "totalAmount": 500.0,
            "checkoutType": "course",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "discountAmount": 100, "finalAmount": 400 },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpCouponApi::new(connector(&server));
    let quote = api
        .validate_and_apply(
            &token(),
            ApplyCouponRequest {
                code: "FLAT100".into(),
                total_amount: dec!(500),
                checkout_type: CheckoutType::Course,
            },
        )
        .await
        .expect("coupon accepted");

    assert_eq!(quote.discount_amount, dec!(100));
    assert_eq!(quote.final_amount, Some(dec!(400)));
}

#[tokio::test]
async fn course_coupon_on_bundle_checkout_is_a_type_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupon/validate-and-apply"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "This coupon is only valid for course checkout",
        })))
        .mount(&server)
        .await;

    let toasts = ToastQueue::new();
    let input = CouponInput::new(
        Arc::new(HttpCouponApi::new(connector(&server))),
        CheckoutType::Bundle,
        Arc::new(toasts.clone()),
    );
    input.set_code("course20").unwrap();

    let session = AuthSession::authenticated(token(), None);
    let err = input.apply(&session, dec!(5100)).await.unwrap_err();

    assert_matches!(err, ServiceError::CouponTypeMismatch(ref m) if m.contains("only valid for course"));
    assert_eq!(input.state(), CouponInputState::Idle);
    assert!(input.applied().is_none());
    assert_eq!(input.discount_amount(), dec!(0));

    let raised = toasts.drain();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].kind, ToastKind::Error);
}

#[tokio::test]
async fn rejection_without_message_uses_generic_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupon/validate-and-apply"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let api = HttpCouponApi::new(connector(&server));
    let err = api
        .validate_and_apply(
            &token(),
            ApplyCouponRequest {
                code: "NOPE".into(),
                total_amount: dec!(100),
                checkout_type: CheckoutType::Course,
            },
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::CouponRejected(ref m) if m == "Invalid or expired coupon");
}

#[tokio::test]
async fn too_many_requests_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupon/validate-and-apply"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "success": false,
            "message": "Too many requests",
        })))
        .mount(&server)
        .await;

    let toasts = ToastQueue::new();
    let input = CouponInput::new(
        Arc::new(HttpCouponApi::new(connector(&server))),
        CheckoutType::Course,
        Arc::new(toasts.clone()),
    );
    input.set_code("SAVE10").unwrap();

    let session = AuthSession::authenticated(token(), None);
    let err = input.apply(&session, dec!(500)).await.unwrap_err();

    assert_matches!(err, ServiceError::RateLimitExceeded);
    assert!(err.is_transient());
    assert_eq!(toasts.drain()[0].kind, ToastKind::Warning);
    assert!(input.is_editable());
}

#[tokio::test]
async fn apply_without_token_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let input = CouponInput::new(
        Arc::new(HttpCouponApi::new(connector(&server))),
        CheckoutType::Course,
        Arc::new(ToastQueue::new()),
    );
    input.set_code("FLAT100").unwrap();

    let err = input
        .apply(&AuthSession::anonymous(), dec!(500))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::AuthRequired);
}

// ==================== Frontend listing ====================

#[tokio::test]
async fn listing_keeps_only_coupons_for_the_checkout_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupon/frontend"))
        .and(body_json(json!({ "checkoutType": "bundle" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                listed_coupon("bundle15", "bundle"),
                listed_coupon("COURSE10", "course"),
            ],
        })))
        .mount(&server)
        .await;

    let input = CouponInput::new(
        Arc::new(HttpCouponApi::new(connector(&server))),
        CheckoutType::Bundle,
        Arc::new(ToastQueue::new()),
    );
    let coupons = input.load_available_coupons().await.expect("listing");

    assert_eq!(coupons.len(), 1);
    assert_eq!(coupons[0].code, "BUNDLE15");
    assert_eq!(input.available_coupons(), coupons);
}

#[tokio::test]
async fn listing_failure_leaves_input_usable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupon/frontend"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let input = CouponInput::new(
        Arc::new(HttpCouponApi::new(connector(&server))),
        CheckoutType::Course,
        Arc::new(ToastQueue::new()),
    );
    input.mount().await;

    assert!(input.available_coupons().is_empty());
    assert!(input.set_code("MANUAL").is_ok());
}

// ==================== Purchases ====================

#[tokio::test]
async fn enroll_posts_receipt_and_coupon() {
    let server = MockServer::start().await;
    let receipt_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/api/payment/enroll"))
        .and(header("authorization", "Bearer test-jwt"))
        .and(body_json(json!({
            "courses": ["c1"],
            "couponCode": "FREE500",
            "receiptId": receipt_id,
            "amount": 0.0,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpPurchaseApi::new(connector(&server));
    api.complete_purchase(
        &token(),
        PurchaseRequest {
            courses: vec!["c1".into()],
            coupon_code: Some("FREE500".into()),
            receipt_id,
            amount: dec!(0),
        },
    )
    .await
    .expect("enrolled");
}

#[tokio::test]
async fn bundle_access_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bundle/request-access"))
        .and(body_json(json!({ "courseIds": ["f1", "f2"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Bundle unavailable",
        })))
        .mount(&server)
        .await;

    let api = HttpPurchaseApi::new(connector(&server));
    let err = api
        .request_bundle_access(&token(), vec!["f1".into(), "f2".into()])
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::ExternalApiError(ref m) if m == "Bundle unavailable");
}

#[tokio::test]
async fn expired_session_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bundle/request-access"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "jwt expired",
        })))
        .mount(&server)
        .await;

    let api = HttpPurchaseApi::new(connector(&server));
    let err = api
        .request_bundle_access(&token(), vec!["f1".into()])
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::Unauthorized(ref m) if m == "jwt expired");
}
