//! Transient success/error notifications raised by the settings forms.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// Fire-and-forget sink for notifications.
pub trait Notifier: Send + Sync {
    fn publish(&self, kind: NotificationKind, message: &str);
}

/// Forwards notifications to a receiver, e.g. a UI event loop.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn publish(&self, kind: NotificationKind, message: &str) {
        let notification = Notification {
            kind,
            message: message.to_string(),
        };
        if self.tx.send(notification).is_err() {
            tracing::debug!(?kind, notification = message, "notification receiver dropped");
        }
    }
}
