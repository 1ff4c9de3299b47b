//! Worker port: the analyze, propose and benchmark contract.

use crate::proposal::domain::{BenchmarkResult, OptimizationProposal};
use crate::task::domain::{AgentType, ResourceCopyId, Task};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Findings produced by a worker's analysis step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Observations about the target.
    #[serde(default)]
    pub insights: Vec<String>,
    /// Problems found.
    #[serde(default)]
    pub issues: Vec<String>,
    /// Areas the proposal should address.
    #[serde(default, rename = "focus_areas")]
    pub focus: Vec<String>,
}

/// An independent worker evaluating a task on its own isolated copy.
///
/// Implementations must only touch the copy they are given.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Worker: Send + Sync {
    /// Role this worker plays.
    fn agent_type(&self) -> AgentType;

    /// Inspects the task against the copy.
    async fn analyze_task(
        &self,
        task: &Task,
        copy_id: &ResourceCopyId,
    ) -> WorkerResult<AnalysisResult>;

    /// Turns an analysis into a concrete proposal.
    async fn propose_optimization(
        &self,
        analysis: &AnalysisResult,
        copy_id: &ResourceCopyId,
    ) -> WorkerResult<OptimizationProposal>;

    /// Applies the proposal on the copy and measures the test queries.
    async fn run_benchmark(
        &self,
        proposal: &OptimizationProposal,
        copy_id: &ResourceCopyId,
    ) -> WorkerResult<Vec<BenchmarkResult>>;
}

/// Builds worker instances for a role.
pub trait WorkerFactory: Send + Sync {
    /// Creates a worker for `agent_type`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Unavailable`] when no worker can be built.
    fn create(&self, agent_type: AgentType) -> WorkerResult<Arc<dyn Worker>>;
}

/// Step of a worker unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerStep {
    /// Analysis.
    Analyze,
    /// Proposal.
    Propose,
    /// Benchmarking.
    Benchmark,
}

impl fmt::Display for WorkerStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Analyze => "analyze",
            Self::Propose => "propose",
            Self::Benchmark => "benchmark",
        })
    }
}

/// Failure of one worker unit.
#[derive(Debug, Clone, Error)]
pub enum WorkerError {
    /// A step reported an error.
    #[error("{step} step failed: {reason}")]
    Step {
        /// Failing step.
        step: WorkerStep,
        /// Worker-provided reason.
        reason: String,
    },

    /// The unit exceeded its deadline.
    #[error("worker timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    /// The unit panicked or was cancelled.
    #[error("worker aborted: {0}")]
    Aborted(String),

    /// No worker could be built for a role.
    #[error("no worker available for {agent_type}: {reason}")]
    Unavailable {
        /// Requested role.
        agent_type: AgentType,
        /// Factory-provided reason.
        reason: String,
    },

    /// No unit produced a result and none reported why.
    #[error("no worker produced a result")]
    NoResult,
}

impl WorkerError {
    /// Builds an analysis failure.
    pub fn analyze(reason: impl Into<String>) -> Self {
        Self::Step {
            step: WorkerStep::Analyze,
            reason: reason.into(),
        }
    }

    /// Builds a proposal failure.
    pub fn propose(reason: impl Into<String>) -> Self {
        Self::Step {
            step: WorkerStep::Propose,
            reason: reason.into(),
        }
    }

    /// Builds a benchmarking failure.
    pub fn benchmark(reason: impl Into<String>) -> Self {
        Self::Step {
            step: WorkerStep::Benchmark,
            reason: reason.into(),
        }
    }
}
