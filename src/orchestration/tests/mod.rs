//! Unit tests for routing, parallel fan-out and task processing.
