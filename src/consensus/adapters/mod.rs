//! Adapter implementations for consensus ports.

pub mod memory;
