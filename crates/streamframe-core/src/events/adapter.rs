use super::{DistinctUntilChanged, MediaEvent};
use crate::notify::{HostEvent, Notifier};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Sender half registered as a listener
pub type EventSink = mpsc::UnboundedSender<MediaEvent>;

/// Opaque listener registration id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Element that dispatches native media events
pub trait MediaEventTarget: Send + Sync {
    /// Forward every `name` event to `sink` until removed
    fn add_listener(&self, name: &str, sink: EventSink) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

/// Merges element events into one de-duplicated host stream
pub struct EventStreamAdapter;

impl EventStreamAdapter {
    /// Start forwarding `names` from `target` to the host
    ///
    /// Must be called from within a tokio runtime. All listeners share one
    /// channel, so events keep the order in which the element delivered them.
    pub fn subscribe(target: Arc<dyn MediaEventTarget>, names: &[String], notifier: Notifier) -> EventSubscription {
        let (tx, mut rx) = mpsc::unbounded_channel::<MediaEvent>();

        let listeners = names
            .iter()
            .map(|name| target.add_listener(name, tx.clone()))
            .collect::<Vec<_>>();
        drop(tx);

        let handle = notifier.handle();
        let task = tokio::spawn(async move {
            let mut distinct = DistinctUntilChanged::new();
            while let Some(event) = rx.recv().await {
                if !distinct.admit(&event) {
                    trace!(%handle, name = %event.name, id = event.id, "Duplicate event suppressed");
                    continue;
                }
                notifier.notify(HostEvent::Player(event));
            }
        });

        debug!(%handle, events = ?names, "Event stream subscribed");

        EventSubscription {
            target,
            listeners,
            task: Some(task),
        }
    }
}

/// Live event subscription; unsubscribes when dropped
pub struct EventSubscription {
    target: Arc<dyn MediaEventTarget>,
    listeners: Vec<ListenerId>,
    task: Option<JoinHandle<()>>,
}

impl EventSubscription {
    /// Number of listeners still attached
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Detach all listeners and stop forwarding
    pub fn unsubscribe(&mut self) {
        for id in self.listeners.drain(..) {
            self.target.remove_listener(id);
        }
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Event stream unsubscribed");
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscription")
            .field("listeners", &self.listeners)
            .field("active", &self.is_active())
            .finish()
    }
}
