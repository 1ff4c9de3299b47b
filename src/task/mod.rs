//! Task lifecycle management for Forkwise.
//!
//! This module owns the task aggregate and its `pending -> in_progress ->
//! {completed, failed}` state machine, plus the per-worker execution records
//! created while a task is processed. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
