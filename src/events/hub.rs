//! Actor-style broadcaster for lifecycle events.
//!
//! All subscriber bookkeeping lives inside one dispatch task. Handles talk to
//! it over one bounded channel, so no registry state is shared between threads.
//! Delivery is at-most-once: a subscriber whose buffer is full when an event
//! arrives is dropped and its channel closed.

use super::Event;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Buffer size of each subscriber channel.
pub const SUBSCRIBER_CAPACITY: usize = 8;

/// Buffer size of the hub's inbound queue.
pub const HUB_QUEUE_CAPACITY: usize = 32;

/// Errors returned by [`EventHub`] handles.
#[derive(Debug, Error)]
pub enum HubError {
    /// The dispatch loop is no longer running.
    #[error("event hub is closed")]
    Closed,
    /// The event could not be encoded.
    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Identifier of a registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// A registered subscriber's end of the hub.
///
/// Events arrive as serialized JSON text. `recv` returns `None` once the
/// subscriber has been unregistered or dropped for falling behind.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Arc<str>>,
}

impl Subscription {
    /// Returns the subscriber identifier, used to unregister.
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next serialized event.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.receiver.recv().await
    }

    /// Returns a pending event without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`mpsc::error::TryRecvError`] when nothing is queued or the
    /// channel is closed.
    pub fn try_recv(&mut self) -> Result<Arc<str>, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

enum HubMessage {
    Register {
        sender: mpsc::Sender<Arc<str>>,
        ack: oneshot::Sender<SubscriberId>,
    },
    Unregister(SubscriberId),
    Count(oneshot::Sender<usize>),
    Broadcast(Arc<str>),
}

/// Handle to the event hub.
///
/// Cloning is cheap. The dispatch loop stops once every handle is dropped.
/// Every handle feeds one queue, so registrations, removals and broadcasts
/// are applied in the order they were issued.
#[derive(Debug, Clone)]
pub struct EventHub {
    inbox: mpsc::Sender<HubMessage>,
}

impl std::fmt::Debug for HubMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register { .. } => f.write_str("Register"),
            Self::Unregister(id) => write!(f, "Unregister({})", id.0),
            Self::Count(_) => f.write_str("Count"),
            Self::Broadcast(_) => f.write_str("Broadcast"),
        }
    }
}

impl EventHub {
    /// Starts the dispatch loop on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn spawn() -> Self {
        let (inbox, inbox_rx) = mpsc::channel(HUB_QUEUE_CAPACITY);
        tokio::spawn(dispatch_loop(inbox_rx));
        Self { inbox }
    }

    async fn send(&self, message: HubMessage) -> Result<(), HubError> {
        self.inbox.send(message).await.map_err(|_| HubError::Closed)
    }

    /// Registers a subscriber.
    ///
    /// Returns once the dispatch loop has recorded the subscriber, so every
    /// event broadcast afterwards reaches it.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] when the dispatch loop has stopped.
    pub async fn register(&self) -> Result<Subscription, HubError> {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_CAPACITY);
        let (ack, acked) = oneshot::channel();
        self.send(HubMessage::Register { sender, ack }).await?;
        let id = acked.await.map_err(|_| HubError::Closed)?;
        Ok(Subscription { id, receiver })
    }

    /// Removes a subscriber and closes its channel.
    ///
    /// Unknown identifiers are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] when the dispatch loop has stopped.
    pub async fn unregister(&self, id: SubscriberId) -> Result<(), HubError> {
        self.send(HubMessage::Unregister(id)).await
    }

    /// Serializes `event` and queues it for every subscriber.
    ///
    /// Waits only for room in the hub's own queue, never on subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Serialization`] when the event cannot be encoded
    /// or [`HubError::Closed`] when the dispatch loop has stopped.
    pub async fn broadcast(&self, event: &Event) -> Result<(), HubError> {
        let encoded: Arc<str> = serde_json::to_string(event)?.into();
        self.send(HubMessage::Broadcast(encoded)).await
    }

    /// Returns the number of registered subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] when the dispatch loop has stopped.
    pub async fn subscriber_count(&self) -> Result<usize, HubError> {
        let (reply, replied) = oneshot::channel();
        self.send(HubMessage::Count(reply)).await?;
        replied.await.map_err(|_| HubError::Closed)
    }
}

async fn dispatch_loop(mut inbox: mpsc::Receiver<HubMessage>) {
    let mut subscribers: BTreeMap<SubscriberId, mpsc::Sender<Arc<str>>> = BTreeMap::new();
    let mut next_id = 0_u64;

    while let Some(message) = inbox.recv().await {
        match message {
            HubMessage::Register { sender, ack } => {
                next_id += 1;
                let id = SubscriberId(next_id);
                subscribers.insert(id, sender);
                if ack.send(id).is_err() {
                    subscribers.remove(&id);
                }
                debug!(subscriber = next_id, "subscriber registered");
            }
            HubMessage::Unregister(id) => {
                if subscribers.remove(&id).is_some() {
                    debug!(subscriber = id.0, "subscriber unregistered");
                }
            }
            HubMessage::Count(reply) => {
                let _ignored = reply.send(subscribers.len());
            }
            HubMessage::Broadcast(encoded) => {
                subscribers.retain(|id, sender| match sender.try_send(Arc::clone(&encoded)) {
                    Ok(()) => true,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(subscriber = id.0, "dropping slow event subscriber");
                        false
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => false,
                });
            }
        }
    }
    debug!("event hub stopped");
}
