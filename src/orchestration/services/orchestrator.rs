//! Parallel fan-out of workers over isolated copies.

use crate::config::{DEFAULT_STATEMENT_TIMEOUT_MS, DEFAULT_WORKER_TIMEOUT_SECS};
use crate::orchestration::ports::{ResourceLifecycle, ResourceLifecycleError, Worker, WorkerError};
use crate::proposal::domain::{BenchmarkResult, OptimizationProposal, ProposalId};
use crate::task::domain::{AgentExecutionId, AgentType, ResourceCopyId, Task, TaskId};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// One worker dispatched onto its own copy.
#[derive(Clone)]
pub struct WorkerAssignment {
    /// Worker to run.
    pub worker: Arc<dyn Worker>,
    /// Copy exclusively owned by the worker for this run.
    pub copy_id: ResourceCopyId,
    /// Execution record tracking the run.
    pub execution_id: AgentExecutionId,
}

impl std::fmt::Debug for WorkerAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerAssignment")
            .field("agent_type", &self.worker.agent_type())
            .field("copy_id", &self.copy_id)
            .field("execution_id", &self.execution_id)
            .finish()
    }
}

/// A worker unit that produced no result.
#[derive(Debug, Clone)]
pub struct WorkerFailure {
    /// Role of the failed worker.
    pub agent_type: AgentType,
    /// Execution record of the failed run.
    pub execution_id: AgentExecutionId,
    /// Why it failed.
    pub error: WorkerError,
}

/// Collected output of a parallel run.
///
/// Proposals carry their worker's role and execution, so callers match them
/// by those stamps rather than by position.
#[derive(Debug, Clone, Default)]
pub struct ParallelRun {
    /// Proposals from successful units, stamped with provisional identities.
    pub proposals: Vec<OptimizationProposal>,
    /// Benchmarks of all successful units, flattened.
    pub benchmarks: Vec<BenchmarkResult>,
    /// Units that failed or timed out.
    pub failures: Vec<WorkerFailure>,
}

/// Outcome of releasing copies.
#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    /// Copies released.
    pub released: Vec<ResourceCopyId>,
    /// Copies that could not be released.
    pub failures: Vec<(ResourceCopyId, ResourceLifecycleError)>,
}

impl CleanupReport {
    /// Returns whether every copy was released.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the first release failure.
    #[must_use]
    pub fn first_error(&self) -> Option<&ResourceLifecycleError> {
        self.failures.first().map(|(_, err)| err)
    }
}

/// Errors returned by [`ParallelOrchestrator`].
#[derive(Debug, Clone, Error)]
pub enum OrchestratorError {
    /// Malformed input.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// No unit produced a proposal.
    #[error("all workers failed: {first}")]
    AllWorkersFailed {
        /// First recorded failure.
        first: WorkerError,
        /// Every failed unit.
        failures: Vec<WorkerFailure>,
    },

    /// Resource lifecycle failure.
    #[error(transparent)]
    Resource(#[from] ResourceLifecycleError),
}

/// Runs workers concurrently and manages their copies.
#[derive(Debug)]
pub struct ParallelOrchestrator<L>
where
    L: ResourceLifecycle,
{
    resources: Arc<L>,
    worker_timeout: Duration,
    statement_timeout_ms: u64,
}

impl<L> Clone for ParallelOrchestrator<L>
where
    L: ResourceLifecycle,
{
    fn clone(&self) -> Self {
        Self {
            resources: Arc::clone(&self.resources),
            worker_timeout: self.worker_timeout,
            statement_timeout_ms: self.statement_timeout_ms,
        }
    }
}

impl<L> ParallelOrchestrator<L>
where
    L: ResourceLifecycle + 'static,
{
    /// Creates an orchestrator with default deadlines.
    #[must_use]
    pub const fn new(resources: Arc<L>) -> Self {
        Self {
            resources,
            worker_timeout: Duration::from_secs(DEFAULT_WORKER_TIMEOUT_SECS),
            statement_timeout_ms: DEFAULT_STATEMENT_TIMEOUT_MS,
        }
    }

    /// Sets the per-worker deadline.
    #[must_use]
    pub const fn with_worker_timeout(mut self, timeout: Duration) -> Self {
        self.worker_timeout = timeout;
        self
    }

    /// Sets the deadline for each statement applied to the shared resource.
    #[must_use]
    pub const fn with_statement_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.statement_timeout_ms = timeout_ms;
        self
    }

    /// Provisions the isolated copy a worker will use for a task.
    ///
    /// Copies are named `fork-{agent_type}-task{task_id}`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Resource`] when provisioning fails.
    pub async fn provision_copy(
        &self,
        parent: &str,
        agent_type: AgentType,
        task_id: TaskId,
    ) -> Result<ResourceCopyId, OrchestratorError> {
        let name = format!("fork-{agent_type}-task{task_id}");
        let copy_id = self.resources.create_copy(parent, &name).await?;
        debug!(copy = %copy_id, agent = %agent_type, "copy provisioned");
        Ok(copy_id)
    }

    /// Runs every assigned worker concurrently.
    ///
    /// Each unit runs analyze, propose and benchmark in sequence under its
    /// own deadline. A failing unit never cancels the others. Proposals are
    /// stamped with a provisional identity, their worker's role and their
    /// execution before benchmarking, and benchmarks are linked to that
    /// provisional identity.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidArgument`] without assignments or
    /// for an unsaved task, and [`OrchestratorError::AllWorkersFailed`] when
    /// no unit produced a proposal.
    pub async fn execute_in_parallel(
        &self,
        task: &Task,
        assignments: Vec<WorkerAssignment>,
    ) -> Result<ParallelRun, OrchestratorError> {
        if assignments.is_empty() {
            return Err(OrchestratorError::InvalidArgument(
                "at least one worker is required",
            ));
        }
        if !task.id().is_assigned() {
            return Err(OrchestratorError::InvalidArgument(
                "task must be persisted before dispatch",
            ));
        }

        let shared_task = Arc::new(task.clone());
        let mut units = Vec::with_capacity(assignments.len());
        for (slot, assignment) in assignments.into_iter().enumerate() {
            let agent_type = assignment.worker.agent_type();
            let execution_id = assignment.execution_id;
            let handle = tokio::spawn(run_unit(
                assignment,
                Arc::clone(&shared_task),
                ProposalId::provisional(slot),
                self.worker_timeout,
            ));
            units.push((agent_type, execution_id, handle));
        }

        let mut run = ParallelRun::default();
        for (agent_type, execution_id, handle) in units {
            let outcome = handle
                .await
                .unwrap_or_else(|join_err| Err(WorkerError::Aborted(join_err.to_string())));
            match outcome {
                Ok((proposal, benchmarks)) => {
                    run.proposals.push(proposal);
                    run.benchmarks.extend(benchmarks);
                }
                Err(error) => {
                    warn!(agent = %agent_type, execution = %execution_id, %error, "worker failed");
                    run.failures.push(WorkerFailure {
                        agent_type,
                        execution_id,
                        error,
                    });
                }
            }
        }

        if run.proposals.is_empty() {
            let first = run
                .failures
                .first()
                .map_or(WorkerError::NoResult, |failure| failure.error.clone());
            return Err(OrchestratorError::AllWorkersFailed {
                first,
                failures: run.failures,
            });
        }
        info!(
            task = %task.id(),
            proposals = run.proposals.len(),
            failed = run.failures.len(),
            "parallel run finished"
        );
        Ok(run)
    }

    /// Applies a proposal's statements to `target` in order.
    ///
    /// Blank statements are skipped. The first failure stops the run and
    /// statements already applied stay applied. Returns the number applied.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidArgument`] for a blank target or a
    /// proposal without statements, and [`OrchestratorError::Resource`] for
    /// the first failing statement.
    pub async fn apply_to_main(
        &self,
        target: &str,
        proposal: &OptimizationProposal,
    ) -> Result<usize, OrchestratorError> {
        if target.trim().is_empty() {
            return Err(OrchestratorError::InvalidArgument("target must not be empty"));
        }
        if proposal.statements().is_empty() {
            return Err(OrchestratorError::InvalidArgument(
                "proposal has no statements",
            ));
        }

        let mut applied = 0;
        for statement in proposal
            .statements()
            .iter()
            .map(|statement| statement.trim())
            .filter(|statement| !statement.is_empty())
        {
            self.resources
                .execute_statement(target, statement, self.statement_timeout_ms)
                .await?;
            applied += 1;
        }
        info!(main_target = target, proposal = %proposal.id(), applied, "proposal applied");
        Ok(applied)
    }

    /// Releases copies, attempting every non-blank identifier.
    ///
    /// Failures are collected in the report rather than returned.
    pub async fn cleanup_copies(&self, copy_ids: &[ResourceCopyId]) -> CleanupReport {
        let mut report = CleanupReport::default();
        for copy_id in copy_ids.iter().filter(|copy_id| !copy_id.is_blank()) {
            match self.resources.destroy_copy(copy_id).await {
                Ok(()) => report.released.push(copy_id.clone()),
                Err(err) => {
                    warn!(copy = %copy_id, error = %err, "failed to release copy");
                    report.failures.push((copy_id.clone(), err));
                }
            }
        }
        report
    }
}

async fn run_unit(
    assignment: WorkerAssignment,
    task: Arc<Task>,
    provisional_id: ProposalId,
    deadline: Duration,
) -> Result<(OptimizationProposal, Vec<BenchmarkResult>), WorkerError> {
    let WorkerAssignment {
        worker,
        copy_id,
        execution_id,
    } = assignment;
    let agent_type = worker.agent_type();

    let steps = async {
        let analysis = worker.analyze_task(&task, &copy_id).await?;
        debug!(agent = %agent_type, issues = analysis.issues.len(), "analysis finished");

        let mut proposal = worker.propose_optimization(&analysis, &copy_id).await?;
        proposal.assign_id(provisional_id);
        proposal.attribute_to(agent_type, execution_id);

        let mut benchmarks = worker.run_benchmark(&proposal, &copy_id).await?;
        for benchmark in &mut benchmarks {
            benchmark.reassign_proposal(provisional_id);
        }
        debug!(agent = %agent_type, runs = benchmarks.len(), "benchmarks finished");
        Ok::<_, WorkerError>((proposal, benchmarks))
    };

    tokio::time::timeout(deadline, steps)
        .await
        .unwrap_or(Err(WorkerError::TimedOut(deadline)))
}
