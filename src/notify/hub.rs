use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{bounded, Sender, TrySendError};
use tracing::debug;

use super::stream::EventStream;
use super::{Event, Notification, Severity};
use crate::graph::Explanation;

/// Identifier of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

type Subscribers = Arc<Mutex<HashMap<SubscriptionId, Sender<Event>>>>;

/// Fans events out to every subscriber without blocking the publisher.
#[derive(Debug)]
pub struct NotificationHub {
    capacity: usize,
    next_id: AtomicU64,
    subscribers: Subscribers,
    dropped: AtomicU64,
}

impl NotificationHub {
    /// Creates a hub whose subscriber channels hold `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            dropped: AtomicU64::new(0),
        }
    }

    /// Opens a new stream receiving every event published from now on.
    pub fn subscribe(&self) -> EventStream {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = bounded(self.capacity);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);
        debug!(subscription = id.0, "event stream opened");
        EventStream::new(id, rx, Arc::downgrade(&self.subscribers))
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Events lost because a subscriber was full.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Non-blocking fan-out. Disconnected subscribers are pruned.
    pub fn publish(&self, event: &Event) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|_, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    /// Publishes a notification.
    pub fn notify(&self, severity: Severity, source: &str, message: impl Into<String>) {
        self.publish(&Event::Notification(Notification::new(severity, source, message)));
    }

    /// Publishes each explanation in order.
    pub fn explain(&self, explanations: &[Explanation]) {
        for explanation in explanations {
            self.publish(&Event::Explanation(explanation.clone()));
        }
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(1024)
    }
}
