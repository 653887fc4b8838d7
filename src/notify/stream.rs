use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, Weak};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::error::{OntoResult, StreamError};

use super::hub::SubscriptionId;
use super::Event;

/// A subscription to a [`NotificationHub`](super::NotificationHub).
///
/// Dropping the stream removes the subscription.
#[derive(Debug)]
pub struct EventStream {
    id: SubscriptionId,
    rx: Receiver<Event>,
    subscribers: Weak<Mutex<HashMap<SubscriptionId, Sender<Event>>>>,
}

impl EventStream {
    pub(super) fn new(
        id: SubscriptionId,
        rx: Receiver<Event>,
        subscribers: Weak<Mutex<HashMap<SubscriptionId, Sender<Event>>>>,
    ) -> Self {
        Self { id, rx, subscribers }
    }

    /// The subscription backing this stream.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Blocks until the next event.
    pub fn recv(&self) -> OntoResult<Event> {
        self.rx.recv().map_err(|_| StreamError::Disconnected.into())
    }

    /// Waits at most `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> OntoResult<Event> {
        self.rx.recv_timeout(timeout).map_err(|err| {
            match err {
                RecvTimeoutError::Timeout => StreamError::Timeout {
                    duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                },
                RecvTimeoutError::Disconnected => StreamError::Disconnected,
            }
            .into()
        })
    }

    /// Next event if one is queued.
    #[must_use]
    pub fn try_recv(&self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Every queued event.
    #[must_use]
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{OntoError, StreamError};
    use crate::notify::NotificationHub;
    use std::time::Duration;

    #[test]
    fn test_timeout_is_reported() {
        let hub = NotificationHub::new(2);
        let stream = hub.subscribe();
        let err = stream.recv_timeout(Duration::from_millis(5)).unwrap_err();
        assert!(matches!(err, OntoError::Stream(StreamError::Timeout { duration_ms: 5 })));
    }

    #[test]
    fn test_stream_outliving_hub_disconnects() {
        let hub = NotificationHub::new(2);
        let stream = hub.subscribe();
        drop(hub);
        assert!(matches!(stream.recv(), Err(OntoError::Stream(StreamError::Disconnected))));
    }
}
