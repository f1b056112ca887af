use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::AuthSession,
    client::CouponApi,
    errors::ServiceError,
    events::{CheckoutEvent, EventSender},
    models::{format_amount, AppliedDiscount, ApplyCouponRequest, CheckoutType, Coupon},
    notifications::{Notifier, Toast, ToastKind},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponInputState {
    /// No coupon applied; the code is editable.
    Idle,
    /// A validate-and-apply request is in flight.
    Validating,
    Applied(AppliedDiscount),
}

#[derive(Debug)]
struct Inner {
    code: String,
    state: CouponInputState,
    available: Vec<Coupon>,
}

/// Coupon entry for one checkout screen.
///
/// Holds the typed code, the advisory list of offered coupons and the applied
/// discount. Only one validate-and-apply request can be in flight per
/// instance; the discount is reported back as the return value of
/// [`CouponInput::apply`] and as a [`CheckoutEvent`].
pub struct CouponInput {
    api: Arc<dyn CouponApi>,
    checkout_type: CheckoutType,
    notifier: Arc<dyn Notifier>,
    events: Option<EventSender>,
    currency_symbol: String,
    inner: Mutex<Inner>,
}

impl CouponInput {
    pub fn new(
        api: Arc<dyn CouponApi>,
        checkout_type: CheckoutType,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            checkout_type,
            notifier,
            events: None,
            currency_symbol: "₹".to_string(),
            inner: Mutex::new(Inner {
                code: String::new(),
                state: CouponInputState::Idle,
                available: Vec::new(),
            }),
        }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn checkout_type(&self) -> CheckoutType {
        self.checkout_type
    }

    pub fn state(&self) -> CouponInputState {
        self.lock().state.clone()
    }

    pub fn code(&self) -> String {
        self.lock().code.clone()
    }

    pub fn applied(&self) -> Option<AppliedDiscount> {
        match &self.lock().state {
            CouponInputState::Applied(discount) => Some(discount.clone()),
            _ => None,
        }
    }

    /// Discount currently reported to the checkout; zero unless applied.
    pub fn discount_amount(&self) -> Decimal {
        self.applied()
            .map(|d| d.discount_amount)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn is_editable(&self) -> bool {
        self.lock().state == CouponInputState::Idle
    }

    pub fn can_submit(&self) -> bool {
        let inner = self.lock();
        inner.state == CouponInputState::Idle && !inner.code.trim().is_empty()
    }

    pub fn button_label(&self) -> &'static str {
        match self.lock().state {
            CouponInputState::Idle => "Apply",
            CouponInputState::Validating => "Applying...",
            CouponInputState::Applied(_) => "Cancel",
        }
    }

    pub fn available_coupons(&self) -> Vec<Coupon> {
        self.lock().available.clone()
    }

    /// Replaces the typed code. Codes are uppercase; edits are refused unless idle.
    pub fn set_code(&self, code: &str) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        if inner.state != CouponInputState::Idle {
            return Err(ServiceError::InvalidOperation(
                "Coupon input is locked".to_string(),
            ));
        }
        inner.code = code.trim().to_uppercase();
        Ok(())
    }

    /// Click-to-fill from the available list. The code still has to go
    /// through [`CouponInput::apply`].
    pub fn select_coupon(&self, code: &str) -> Result<(), ServiceError> {
        self.set_code(code)?;
        debug!(code = %code, "coupon selected from list");
        Ok(())
    }

    /// Fetches the coupons offered for this checkout type.
    ///
    /// Entries linked to another checkout type are dropped even if the
    /// backend returned them.
    #[instrument(skip(self), fields(checkout_type = %self.checkout_type))]
    pub async fn load_available_coupons(&self) -> Result<Vec<Coupon>, ServiceError> {
        let coupons = self.api.list_frontend_coupons(self.checkout_type).await?;
        let total = coupons.len();
        let filtered: Vec<Coupon> = coupons
            .into_iter()
            .filter(|c| c.linked_to == self.checkout_type)
            .collect();

        if filtered.len() != total {
            warn!(
                dropped = total - filtered.len(),
                "listing returned coupons for another checkout type"
            );
        }

        self.lock().available = filtered.clone();
        Ok(filtered)
    }

    /// Mount hook: loads the listing, logging failures since the list is
    /// advisory only.
    pub async fn mount(&self) {
        if let Err(e) = self.load_available_coupons().await {
            warn!(error = %e, "could not load available coupons");
        }
    }

    /// Validates the typed code against the backend and applies it to
    /// `total_amount`.
    ///
    /// Fails fast with `AuthRequired` and no request when the session has no
    /// token. Every failure raises a toast and leaves the input idle; nothing
    /// is retried.
    #[instrument(skip(self, session), fields(checkout_type = %self.checkout_type))]
    pub async fn apply(
        &self,
        session: &AuthSession,
        total_amount: Decimal,
    ) -> Result<AppliedDiscount, ServiceError> {
        let token = session.require_token();
        let claimed = {
            let mut inner = self.lock();
            match inner.state {
                CouponInputState::Idle => {}
                CouponInputState::Validating => {
                    return Err(ServiceError::InvalidOperation(
                        "A coupon is already being validated".to_string(),
                    ));
                }
                CouponInputState::Applied(_) => {
                    return Err(ServiceError::InvalidOperation(
                        "Remove the applied coupon first".to_string(),
                    ));
                }
            }
            let code = inner.code.trim().to_string();
            if code.is_empty() {
                Err(ServiceError::InvalidInput(
                    "Please enter a coupon code".to_string(),
                ))
            } else {
                token.map(|token| {
                    // Claimed under the same lock as the Idle check.
                    inner.state = CouponInputState::Validating;
                    (code, token)
                })
            }
        };
        let (code, token) = match claimed {
            Ok(claimed) => claimed,
            Err(e) => return Err(self.report(e)),
        };

        let guard = ValidatingGuard::claimed(&self.inner);
        let request = ApplyCouponRequest {
            code: code.clone(),
            total_amount,
            checkout_type: self.checkout_type,
        };

        let quote = match self.api.validate_and_apply(token, request).await {
            Ok(quote) => quote,
            Err(e) => {
                drop(guard);
                return Err(self.report(e));
            }
        };

        let applied = AppliedDiscount::new(code, total_amount, quote.discount_amount);
        if let Some(server_final) = quote.final_amount {
            if server_final != applied.final_amount {
                warn!(
                    %server_final,
                    local_final = %applied.final_amount,
                    "backend final amount differs from local computation"
                );
            }
        }

        guard.complete(CouponInputState::Applied(applied.clone()));
        info!(code = %applied.code, discount = %applied.discount_amount, "coupon applied");

        self.notifier.success(&format!(
            "Coupon applied! You saved {}",
            format_amount(&self.currency_symbol, applied.discount_amount)
        ));
        if let Some(events) = &self.events {
            events.send_or_log(CheckoutEvent::CouponApplied {
                code: applied.code.clone(),
                checkout_type: self.checkout_type,
                discount_amount: applied.discount_amount,
                final_amount: applied.final_amount,
            });
        }

        Ok(applied)
    }

    /// Removes the applied coupon and returns it. Afterwards the reported
    /// discount is zero and the input is editable again.
    pub fn cancel(&self) -> Option<AppliedDiscount> {
        let removed = {
            let mut inner = self.lock();
            match std::mem::replace(&mut inner.state, CouponInputState::Idle) {
                CouponInputState::Applied(discount) => {
                    inner.code.clear();
                    Some(discount)
                }
                other => {
                    inner.state = other;
                    None
                }
            }
        };

        if let Some(discount) = &removed {
            info!(code = %discount.code, "coupon cancelled");
            self.notifier
                .notify(Toast::new(ToastKind::Info, "Coupon removed"));
            if let Some(events) = &self.events {
                events.send_or_log(CheckoutEvent::CouponCleared {
                    code: discount.code.clone(),
                });
            }
        }
        removed
    }

    fn report(&self, err: ServiceError) -> ServiceError {
        warn!(error = %err, "coupon apply failed");
        self.notifier
            .notify(Toast::new(err.toast_kind(), err.user_message()));
        err
    }
}

/// Marks the input as validating for the lifetime of a request. Dropping it
/// before `complete` (error, or the caller dropped the future) returns the
/// input to idle, discarding any late response.
struct ValidatingGuard<'a> {
    inner: &'a Mutex<Inner>,
    completed: bool,
}

impl<'a> ValidatingGuard<'a> {
    /// Takes over an input whose state the caller already set to validating.
    fn claimed(inner: &'a Mutex<Inner>) -> Self {
        Self {
            inner,
            completed: false,
        }
    }

    fn complete(mut self, state: CouponInputState) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).state = state;
        self.completed = true;
    }
}

impl Drop for ValidatingGuard<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state == CouponInputState::Validating {
            inner.state = CouponInputState::Idle;
        }
    }
}
