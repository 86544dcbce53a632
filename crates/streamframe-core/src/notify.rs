//! Outbound notifications to the host

use crate::events::MediaEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;
use uuid::Uuid;

/// Unique identifier for a player handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleId(pub Uuid);

impl HandleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-facing notification payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    /// Manifest loaded and playback started
    Loaded { manifest_url: String },

    /// Manifest load failed; the handle stays usable
    LoadFailed { manifest_url: String, cause: String },

    /// Native media element event
    Player(MediaEvent),
}

/// Notification with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Handle that produced the notification
    pub handle: HandleId,
    /// Sequence number, per handle
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: HostEvent,
}

/// Receiving end handed to the host
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// Publishes notifications for one handle
#[derive(Debug, Clone)]
pub struct Notifier {
    handle: HandleId,
    sequence: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Create a notifier and the host's receiver
    pub fn channel(handle: HandleId) -> (Self, NotificationReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Self {
            handle,
            sequence: Arc::new(AtomicU64::new(0)),
            tx,
        };
        (notifier, rx)
    }

    pub fn handle(&self) -> HandleId {
        self.handle
    }

    /// Publish an event; dropped silently once the host stops listening
    pub fn notify(&self, event: HostEvent) {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let notification = Notification {
            handle: self.handle,
            sequence,
            timestamp: Utc::now(),
            event,
        };

        if self.tx.send(notification).is_err() {
            trace!(handle = %self.handle, sequence, "Host receiver closed, notification dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notifications_are_sequenced() {
        let (notifier, mut rx) = Notifier::channel(HandleId::new());

        notifier.notify(HostEvent::Loaded { manifest_url: "a.mpd".into() });
        notifier.notify(HostEvent::Player(MediaEvent::new("play", 1, 0.0)));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(first.handle, notifier.handle());
    }

    #[test]
    fn test_notify_after_receiver_dropped() {
        let (notifier, rx) = Notifier::channel(HandleId::new());
        drop(rx);
        notifier.notify(HostEvent::Loaded { manifest_url: "a.mpd".into() });
    }

    #[test]
    fn test_notification_json_shape() {
        let (notifier, mut rx) = Notifier::channel(HandleId::new());
        notifier.notify(HostEvent::LoadFailed {
            manifest_url: "a.mpd".into(),
            cause: "network timeout".into(),
        });

        let json = serde_json::to_value(rx.try_recv().unwrap()).unwrap();
        assert_eq!(json["event"], "load_failed");
        assert_eq!(json["cause"], "network timeout");
        assert_eq!(json["sequence"], 1);
    }
}
