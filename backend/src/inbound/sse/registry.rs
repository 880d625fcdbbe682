//! Process-wide set of open live-feed connections.
//!
//! Each subscriber owns a bounded channel whose receiving half backs one
//! HTTP event stream. The registry keeps the sending halves, keyed by a
//! per-connection id, and hands out point-in-time snapshots so broadcasts
//! never iterate under the lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use actix_web::web::Bytes;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Opaque connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a frame could not be handed to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("subscriber is closed")]
    Closed,
    #[error("subscriber buffer is full")]
    Full,
}

/// Registry rejected a new subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("live feed is at capacity ({limit} subscribers)")]
    Full { limit: usize },
}

/// Closed flag shared between the registry entry and the stream it feeds.
#[derive(Debug, Default)]
pub(crate) struct SubscriberState {
    closed: AtomicBool,
}

impl SubscriberState {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Sending half of one live-feed connection.
///
/// Cloned into registry snapshots; the receiving half stays with the stream.
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: SubscriberId,
    sender: mpsc::Sender<Bytes>,
    state: Arc<SubscriberState>,
}

impl Subscriber {
    /// Create a subscriber with room for `buffer` undelivered frames.
    pub fn channel(buffer: usize) -> (Self, SubscriberInbox) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let state = Arc::new(SubscriberState::default());
        let id = SubscriberId::random();
        (
            Self {
                id,
                sender,
                state: Arc::clone(&state),
            },
            SubscriberInbox {
                id,
                receiver,
                state,
            },
        )
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed() || self.sender.is_closed()
    }

    /// Queue a frame without waiting.
    pub fn try_deliver(&self, frame: Bytes) -> Result<(), DeliveryError> {
        if self.state.is_closed() {
            return Err(DeliveryError::Closed);
        }
        self.sender.try_send(frame).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Receiving half of one live-feed connection.
#[derive(Debug)]
pub struct SubscriberInbox {
    pub(crate) id: SubscriberId,
    pub(crate) receiver: mpsc::Receiver<Bytes>,
    pub(crate) state: Arc<SubscriberState>,
}

impl SubscriberInbox {
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

/// Set of currently connected subscribers.
///
/// # Examples
/// ```
/// use citizens_backend::inbound::sse::{Subscriber, SubscriberRegistry};
///
/// let registry = SubscriberRegistry::new();
/// let (subscriber, _inbox) = Subscriber::channel(8);
/// let id = subscriber.id();
/// registry.register(subscriber).unwrap();
/// assert_eq!(registry.len(), 1);
/// assert!(registry.unregister(id));
/// assert!(!registry.unregister(id));
/// ```
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    subscribers: Mutex<HashMap<SubscriberId, Subscriber>>,
    max_subscribers: Option<usize>,
}

impl SubscriberRegistry {
    /// Registry without a capacity limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry refusing registrations beyond `limit` live subscribers.
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            subscribers: Mutex::default(),
            max_subscribers: Some(limit),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<SubscriberId, Subscriber>> {
        // Entries hold no cross-field invariants, so a poisoned map is still usable.
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a subscriber.
    pub fn register(&self, subscriber: Subscriber) -> Result<(), RegistryError> {
        let mut entries = self.entries();
        if let Some(limit) = self.max_subscribers.filter(|limit| entries.len() >= *limit) {
            return Err(RegistryError::Full { limit });
        }
        debug!(subscriber_id = %subscriber.id(), "subscriber registered");
        entries.insert(subscriber.id(), subscriber);
        Ok(())
    }

    /// Remove a subscriber and mark it closed. Returns whether it was present.
    ///
    /// Idempotent: later calls for the same id return `false`.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.entries().remove(&id);
        match removed {
            Some(subscriber) => {
                subscriber.state.close();
                debug!(subscriber_id = %id, "subscriber unregistered");
                true
            }
            None => false,
        }
    }

    /// Point-in-time copy of the registered subscribers.
    pub fn snapshot(&self) -> Vec<Subscriber> {
        self.entries().values().cloned().collect()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.entries().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    //! Registration bookkeeping and delivery outcomes.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn register_and_unregister_track_membership() {
        let registry = SubscriberRegistry::new();
        let (first, _first_inbox) = Subscriber::channel(4);
        let (second, _second_inbox) = Subscriber::channel(4);
        let first_id = first.id();
        registry.register(first).expect("register first");
        registry.register(second).expect("register second");

        assert_eq!(registry.len(), 2);
        assert!(registry.unregister(first_id));
        assert!(!registry.contains(first_id));
        assert_eq!(registry.len(), 1);
    }

    #[rstest]
    fn unregister_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let (subscriber, _inbox) = Subscriber::channel(4);
        let id = subscriber.id();
        registry.register(subscriber).expect("register");

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());
    }

    #[rstest]
    fn unregister_closes_snapshot_copies() {
        let registry = SubscriberRegistry::new();
        let (subscriber, _inbox) = Subscriber::channel(4);
        let id = subscriber.id();
        registry.register(subscriber).expect("register");
        let snapshot = registry.snapshot();

        registry.unregister(id);

        let copy = snapshot.first().expect("one subscriber");
        assert!(copy.is_closed());
        assert_eq!(
            copy.try_deliver(Bytes::from_static(b"x")),
            Err(DeliveryError::Closed)
        );
    }

    #[rstest]
    fn capacity_limit_rejects_extra_subscribers() {
        let registry = SubscriberRegistry::with_capacity_limit(1);
        let (first, _first_inbox) = Subscriber::channel(4);
        let (second, _second_inbox) = Subscriber::channel(4);
        registry.register(first).expect("within limit");

        assert_eq!(
            registry.register(second),
            Err(RegistryError::Full { limit: 1 })
        );
        assert_eq!(registry.len(), 1);
    }

    #[rstest]
    fn full_buffer_is_reported() {
        let (subscriber, _inbox) = Subscriber::channel(1);
        subscriber
            .try_deliver(Bytes::from_static(b"one"))
            .expect("first frame fits");
        assert_eq!(
            subscriber.try_deliver(Bytes::from_static(b"two")),
            Err(DeliveryError::Full)
        );
    }

    #[rstest]
    fn dropped_inbox_is_reported_closed() {
        let (subscriber, inbox) = Subscriber::channel(1);
        drop(inbox);
        assert!(subscriber.is_closed());
        assert_eq!(
            subscriber.try_deliver(Bytes::from_static(b"x")),
            Err(DeliveryError::Closed)
        );
    }
}
