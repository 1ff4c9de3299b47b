//! Lifecycle events reported to external observers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kinds of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A task was submitted.
    TaskCreated,
    /// Processing started and workers are being chosen.
    AgentsAssigned,
    /// An isolated copy was provisioned for a worker.
    ForkCreated,
    /// Workers were dispatched.
    AnalysisCompleted,
    /// A proposal was stored.
    ProposalSubmitted,
    /// All proposals were benchmarked.
    BenchmarkCompleted,
    /// A winning proposal was chosen.
    ConsensusReached,
    /// The winner was applied to the shared resource.
    OptimizationApplied,
    /// The task finished successfully.
    TaskCompleted,
    /// The task failed.
    TaskFailed,
    /// A transport accepted a new observer.
    ConnectionEstablished,
}

impl EventType {
    /// Returns the wire name of the event type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task_created",
            Self::AgentsAssigned => "agents_assigned",
            Self::ForkCreated => "fork_created",
            Self::AnalysisCompleted => "analysis_completed",
            Self::ProposalSubmitted => "proposal_submitted",
            Self::BenchmarkCompleted => "benchmark_completed",
            Self::ConsensusReached => "consensus_reached",
            Self::OptimizationApplied => "optimization_applied",
            Self::TaskCompleted => "task_completed",
            Self::TaskFailed => "task_failed",
            Self::ConnectionEstablished => "connection_established",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle event.
///
/// Serializes as `{"type": ..., "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event kind.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Free-form payload.
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl Event {
    /// Creates an event with an empty payload.
    #[must_use]
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            payload: Map::new(),
        }
    }

    /// Adds a payload field.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_owned(), value.into());
        self
    }

    /// Returns a payload field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}
