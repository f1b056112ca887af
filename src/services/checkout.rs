use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    auth::AuthSession,
    client::{PurchaseApi, PurchaseRequest},
    errors::ServiceError,
    events::{CheckoutEvent, EventSender},
    models::{course::partition_ids, AppliedDiscount, CheckoutType, Course},
    notifications::Notifier,
    services::{
        payments::{PaymentError, PaymentGateway, Receipt, PAY_FIRST_MESSAGE},
        pricing::{self, PricingBreakdown},
    },
};

/// Shown when paid courses were enrolled but free bundle courses were not.
pub const ACCESS_PENDING_MESSAGE: &str =
    "Purchase completed, but access to the free courses could not be requested. Please contact support";

/// What is being bought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CheckoutItems {
    Course(Course),
    Bundle(Vec<Course>),
}

/// Checkout screen state: the selection read once at mount plus the coupon
/// discount reported by the coupon input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    items: CheckoutItems,
    coupon: Option<AppliedDiscount>,
}

/// Price lines shown above the pay button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub original_price: Decimal,
    pub bundle_discount: Decimal,
    pub base_price: Decimal,
    pub coupon_discount: Decimal,
    pub final_amount: Decimal,
}

impl CheckoutSession {
    pub fn course(course: Course) -> Self {
        Self {
            items: CheckoutItems::Course(course),
            coupon: None,
        }
    }

    pub fn bundle(courses: Vec<Course>) -> Result<Self, ServiceError> {
        if courses.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Select at least one course for the bundle".to_string(),
            ));
        }
        Ok(Self {
            items: CheckoutItems::Bundle(courses),
            coupon: None,
        })
    }

    pub fn items(&self) -> &CheckoutItems {
        &self.items
    }

    pub fn courses(&self) -> &[Course] {
        match &self.items {
            CheckoutItems::Course(course) => std::slice::from_ref(course),
            CheckoutItems::Bundle(courses) => courses,
        }
    }

    pub fn checkout_type(&self) -> CheckoutType {
        match self.items {
            CheckoutItems::Course(_) => CheckoutType::Course,
            CheckoutItems::Bundle(_) => CheckoutType::Bundle,
        }
    }

    /// Course price, or the tiered bundle price.
    pub fn base_price(&self) -> Decimal {
        match &self.items {
            CheckoutItems::Course(course) => course.payable_price(),
            CheckoutItems::Bundle(courses) => pricing::bundle_price(courses),
        }
    }

    pub fn coupon(&self) -> Option<&AppliedDiscount> {
        self.coupon.as_ref()
    }

    pub fn coupon_discount(&self) -> Decimal {
        self.coupon
            .as_ref()
            .map(|c| c.discount_amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Records the discount reported by the coupon input; `None` clears it.
    pub fn set_coupon(&mut self, coupon: Option<AppliedDiscount>) {
        self.coupon = coupon;
    }

    pub fn final_amount(&self) -> Decimal {
        pricing::final_amount(self.base_price(), self.coupon_discount())
    }

    pub fn summary(&self) -> PriceSummary {
        let (original, bundle_discount) = match &self.items {
            CheckoutItems::Course(course) => (course.payable_price(), Decimal::ZERO),
            CheckoutItems::Bundle(courses) => {
                let breakdown = PricingBreakdown::for_bundle(courses);
                (breakdown.original_price, breakdown.savings)
            }
        };
        PriceSummary {
            original_price: original,
            bundle_discount,
            base_price: self.base_price(),
            coupon_discount: self.coupon_discount(),
            final_amount: self.final_amount(),
        }
    }

    /// Ids of (paid, free) courses in selection order.
    pub fn partition(&self) -> (Vec<String>, Vec<String>) {
        partition_ids(self.courses())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PurchaseOutcome {
    /// Paid courses enrolled; free courses of a mixed bundle requested.
    /// `access_failed` lists free courses whose access request failed after
    /// enrollment succeeded; the receipt still stands.
    Completed {
        receipt: Receipt,
        enrolled: Vec<String>,
        access_requested: Vec<String>,
        access_failed: Vec<String>,
    },
    /// Every selected course is free; only access was requested.
    AccessRequested { course_ids: Vec<String> },
    /// The amount still owed is not zero and the gateway does not collect it.
    PayFirst { amount: Decimal },
}

/// Drives the buy action of a checkout screen.
pub struct PurchaseService {
    gateway: Arc<dyn PaymentGateway>,
    purchases: Arc<dyn PurchaseApi>,
    notifier: Arc<dyn Notifier>,
    events: Option<EventSender>,
}

impl PurchaseService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        purchases: Arc<dyn PurchaseApi>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            gateway,
            purchases,
            notifier,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Runs the purchase for `checkout`.
    ///
    /// All-free bundles go straight to the bundle access request. Anything
    /// else is charged through the gateway first; when the gateway answers
    /// `PaymentRequired` the outcome is `PayFirst` and nothing downstream is
    /// called. Errors raise a toast and are returned; nothing is retried.
    #[instrument(skip(self, session, checkout), fields(checkout_type = %checkout.checkout_type()))]
    pub async fn purchase(
        &self,
        session: &AuthSession,
        checkout: &CheckoutSession,
    ) -> Result<PurchaseOutcome, ServiceError> {
        let result = self.run(session, checkout).await;
        match &result {
            Ok(PurchaseOutcome::PayFirst { .. }) => self.notifier.error(PAY_FIRST_MESSAGE),
            Ok(PurchaseOutcome::Completed { access_failed, .. }) if !access_failed.is_empty() => {
                self.notifier.warning(ACCESS_PENDING_MESSAGE)
            }
            Ok(PurchaseOutcome::Completed { .. }) => {
                self.notifier.success("Purchase completed. Happy learning!")
            }
            Ok(PurchaseOutcome::AccessRequested { .. }) => {
                self.notifier.success("Access requested for the selected courses")
            }
            Err(e) => {
                warn!(error = %e, "purchase failed");
                self.notifier.error(&e.user_message());
            }
        }
        result
    }

    async fn run(
        &self,
        session: &AuthSession,
        checkout: &CheckoutSession,
    ) -> Result<PurchaseOutcome, ServiceError> {
        let token = session.require_token()?;
        let (paid, free) = checkout.partition();

        if paid.is_empty() && checkout.checkout_type() == CheckoutType::Bundle {
            self.purchases
                .request_bundle_access(token, free.clone())
                .await?;
            info!(courses = free.len(), "free bundle access requested");
            self.emit(CheckoutEvent::BundleAccessRequested {
                course_ids: free.clone(),
            });
            return Ok(PurchaseOutcome::AccessRequested { course_ids: free });
        }

        let amount = checkout.final_amount();
        let receipt = match self.gateway.charge(amount).await {
            Ok(receipt) => receipt,
            Err(PaymentError::PaymentRequired { amount }) => {
                info!(%amount, "purchase blocked until payment");
                self.emit(CheckoutEvent::PurchaseRejected { amount });
                return Ok(PurchaseOutcome::PayFirst { amount });
            }
            Err(e) => return Err(e.into()),
        };

        // A single free course has nothing to charge but is still enrolled.
        let enrolled = if paid.is_empty() { free.clone() } else { paid };
        let mut access_requested = if checkout.checkout_type() == CheckoutType::Bundle {
            free
        } else {
            Vec::new()
        };
        let mut access_failed = Vec::new();

        self.purchases
            .complete_purchase(
                token,
                PurchaseRequest {
                    courses: enrolled.clone(),
                    coupon_code: checkout.coupon().map(|c| c.code.clone()),
                    receipt_id: receipt.id,
                    amount: receipt.amount,
                },
            )
            .await?;

        // Enrollment is settled; access failures are reported in the outcome.
        if !access_requested.is_empty() {
            match self
                .purchases
                .request_bundle_access(token, access_requested.clone())
                .await
            {
                Ok(()) => self.emit(CheckoutEvent::BundleAccessRequested {
                    course_ids: access_requested.clone(),
                }),
                Err(e) => {
                    warn!(
                        receipt_id = %receipt.id,
                        error = %e,
                        "enrolled but free course access request failed"
                    );
                    access_failed = std::mem::take(&mut access_requested);
                }
            }
        }

        info!(receipt_id = %receipt.id, courses = enrolled.len(), "purchase completed");
        self.emit(CheckoutEvent::PurchaseCompleted {
            receipt_id: receipt.id,
            course_ids: enrolled.clone(),
            amount: receipt.amount,
        });

        Ok(PurchaseOutcome::Completed {
            receipt,
            enrolled,
            access_requested,
            access_failed,
        })
    }

    fn emit(&self, event: CheckoutEvent) {
        if let Some(events) = &self.events {
            events.send_or_log(event);
        }
    }
}
