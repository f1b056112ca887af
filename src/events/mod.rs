use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::CheckoutType;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<CheckoutEvent>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<CheckoutEvent>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<CheckoutEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    pub async fn send(&self, event: CheckoutEvent) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends without waiting; a full or closed channel is logged and dropped.
    pub fn send_or_log(&self, event: CheckoutEvent) {
        if let Err(e) = self.sender.try_send(event) {
            warn!("Dropping checkout event: {}", e);
        }
    }
}

/// Events a checkout screen publishes to whoever renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CheckoutEvent {
    CouponApplied {
        code: String,
        checkout_type: CheckoutType,
        discount_amount: Decimal,
        final_amount: Decimal,
    },
    /// The applied coupon was cancelled; the reported discount is now zero.
    CouponCleared {
        code: String,
    },
    PurchaseCompleted {
        receipt_id: Uuid,
        course_ids: Vec<String>,
        amount: Decimal,
    },
    BundleAccessRequested {
        course_ids: Vec<String>,
    },
    PurchaseRejected {
        amount: Decimal,
    },
}

/// Logs every event until the channel closes.
pub async fn process_events(mut rx: mpsc::Receiver<CheckoutEvent>) {
    info!("Starting checkout event loop");

    while let Some(event) = rx.recv().await {
        match &event {
            CheckoutEvent::CouponApplied {
                code,
                discount_amount,
                ..
            } => info!(%code, %discount_amount, "coupon applied"),
            CheckoutEvent::CouponCleared { code } => info!(%code, "coupon cleared"),
            CheckoutEvent::PurchaseCompleted {
                receipt_id, amount, ..
            } => info!(%receipt_id, %amount, "purchase completed"),
            CheckoutEvent::BundleAccessRequested { course_ids } => {
                info!(courses = course_ids.len(), "bundle access requested")
            }
            CheckoutEvent::PurchaseRejected { amount } => {
                warn!(%amount, "purchase rejected, payment required")
            }
        }
    }

    info!("Checkout event loop stopped");
}
