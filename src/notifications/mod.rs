use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use strum::{Display, EnumString};
use tracing::{error, info, warn};
use uuid::Uuid;

/// A transient user-visible notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToastKind {
    Success,
    Info,
    Warning,
    Error,
}

/// Sink for toasts raised by checkout services.
///
/// Failures are reported here at the service boundary; nothing propagates to
/// a global handler.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);

    fn success(&self, message: &str) {
        self.notify(Toast::new(ToastKind::Success, message));
    }

    fn warning(&self, message: &str) {
        self.notify(Toast::new(ToastKind::Warning, message));
    }

    fn error(&self, message: &str) {
        self.notify(Toast::new(ToastKind::Error, message));
    }
}

/// Collects toasts in memory so a UI layer can drain and render them.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every pending toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        let mut guard = self.toasts.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *guard)
    }

    pub fn snapshot(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.toasts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, toast: Toast) {
        self.toasts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(toast);
    }
}

/// Writes toasts to the log. Used by the CLI where there is no toast surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Success | ToastKind::Info => info!(kind = %toast.kind, "{}", toast.message),
            ToastKind::Warning => warn!(kind = %toast.kind, "{}", toast.message),
            ToastKind::Error => error!(kind = %toast.kind, "{}", toast.message),
        }
    }
}
