//! Orchestration: running competing workers on isolated copies.
//!
//! A [`services::TaskProcessor`] moves a task from `pending` to a terminal
//! state. It chooses workers, provisions one copy per worker through the
//! [`ports::ResourceLifecycle`] port, runs the workers in parallel with the
//! [`services::ParallelOrchestrator`], hands the results to consensus and
//! reports progress on the event hub. Copies are always released.

pub mod adapters;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
