//! Forkwise: competing optimisation workers on isolated copies, settled by
//! weighted consensus.
//!
//! A submitted task is handed to several independent workers. Each worker
//! gets its own copy of the shared resource, analyses the task, proposes a
//! change and benchmarks it. The proposals are scored on performance,
//! storage, complexity and risk, the best one wins and, when configured, is
//! applied to the shared resource. Progress is broadcast as lifecycle
//! events.
//!
//! # Architecture
//!
//! Each slice follows hexagonal architecture:
//!
//! - **Domain**: pure types and invariants
//! - **Ports**: async traits for persistence, workers and resources
//! - **Adapters**: in-memory implementations for tests and local runs
//! - **Services**: orchestration logic
//!
//! # Modules
//!
//! - [`task`]: tasks, their state machine and per-worker execution records
//! - [`proposal`]: proposals and benchmark evidence
//! - [`consensus`]: scoring and the consensus decision
//! - [`orchestration`]: worker routing, parallel fan-out and task processing
//! - [`events`]: lifecycle events and the broadcasting hub
//! - [`config`]: TOML configuration
//! - [`telemetry`]: tracing subscriber setup

pub mod config;
pub mod consensus;
pub mod events;
pub mod orchestration;
pub mod proposal;
pub mod task;
pub mod telemetry;
