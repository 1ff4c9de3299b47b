//! Unit tests for lifecycle events and the event hub.
