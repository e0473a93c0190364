use std::collections::BTreeMap;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::{ Arc, Mutex, Weak };

use crate::notice::Notification;

/// Published after every widget state transition. Views re-render on these
/// instead of observing state directly.
#[derive(Clone, Debug, PartialEq)]
pub enum WidgetEvent {
    OpenChanged(bool),
    ConversationsChanged,
    ActiveConversationChanged(Option<i64>),
    MessagesChanged,
    BusyChanged(bool),
    HistoryLoading(bool),
    DraftChanged,
    NotificationShown(Notification),
    NotificationHidden,
}

type EventCallback = Arc<dyn Fn(&WidgetEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    callbacks: Mutex<BTreeMap<usize, EventCallback>>,
    next_id: AtomicUsize,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
        where F: Fn(&WidgetEvent) + Send + Sync + 'static
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.insert(id, Arc::new(callback));
        }
        Subscription { id, bus: Arc::downgrade(self) }
    }

    /// Callbacks are cloned out first so a callback may subscribe or
    /// unsubscribe without deadlocking.
    pub fn publish(&self, event: WidgetEvent) {
        let callbacks: Vec<EventCallback> = match self.callbacks.lock() {
            Ok(guard) => guard.values().cloned().collect(),
            Err(_) => {
                return;
            }
        };
        for callback in callbacks {
            callback(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks
            .lock()
            .map(|c| c.len())
            .unwrap_or(0)
    }

    fn unsubscribe(&self, id: usize) {
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.remove(&id);
        }
    }
}

/// Unsubscribes on drop.
pub struct Subscription {
    id: usize,
    bus: Weak<EventBus>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.id);
        }
    }
}
