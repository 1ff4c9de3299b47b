//! Lifecycle event broadcasting.
//!
//! The task processor reports progress as [`Event`]s through an
//! [`EventHub`]. Transports wrapping the library register subscriptions and
//! forward the serialized events to their clients.

mod event;
mod hub;

pub use event::{Event, EventType};
pub use hub::{
    EventHub, HUB_QUEUE_CAPACITY, HubError, SUBSCRIBER_CAPACITY, SubscriberId, Subscription,
};

#[cfg(test)]
mod tests;
