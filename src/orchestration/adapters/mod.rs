//! Adapter implementations for orchestration ports.

pub mod memory;
pub mod scripted;
