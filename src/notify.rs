//! Outcome notifications
//!
//! Every cart mutation attempt resolves to exactly one notification so the
//! shopper always knows whether their action was applied. The storefront UI
//! provides its own [`CartNotifier`]; [`TracingNotifier`] is the headless
//! default.

use mockall::automock;
use tracing::{error, info};

/// Whether the attempted mutation was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The mutation was applied.
    Success,

    /// The mutation was rejected or failed; state is unchanged.
    Error,
}

/// A user-facing outcome message for one mutation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Outcome kind.
    pub kind: NotificationKind,

    /// Short user-facing message.
    pub message: String,
}

impl Notification {
    /// A success notification with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    /// An error notification with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Sink for mutation outcome notifications.
#[automock]
pub trait CartNotifier: Send + Sync {
    /// Deliver one notification to the shopper.
    fn notify(&self, notification: Notification);
}

/// Notifier that writes outcomes to the log instead of a UI.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl CartNotifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => info!(message = %notification.message, "cart notification"),
            NotificationKind::Error => error!(message = %notification.message, "cart notification"),
        }
    }
}
