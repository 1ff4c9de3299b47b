//! Task processing: the composition root tying workers, scoring and events
//! together.

use super::{
    AgentSelector, CleanupReport, OrchestratorError, ParallelOrchestrator, ParallelRun,
    WorkerAssignment, WorkerFailure,
};
use crate::config::{OrchestrationConfig, WorkerSelection};
use crate::consensus::{
    adapters::memory::InMemoryConsensusRepository,
    domain::{ConsensusDecision, ConsensusDomainError},
    ports::{ConsensusRepository, ConsensusRepositoryError},
    services::{ConsensusEngine, ScoringError},
};
use crate::events::{Event, EventHub, EventType};
use crate::orchestration::ports::{ResourceLifecycle, WorkerError, WorkerFactory};
use crate::proposal::{
    adapters::memory::{InMemoryBenchmarkRepository, InMemoryProposalRepository},
    domain::{BenchmarkResult, OptimizationProposal, ProposalId},
    ports::{BenchmarkRepository, ProposalRepository, ProposalRepositoryError},
};
use crate::task::{
    adapters::memory::{InMemoryAgentExecutionRepository, InMemoryTaskRepository},
    domain::{
        AgentExecution, AgentExecutionId, AgentType, ResourceCopyId, Task, TaskDomainError, TaskId,
        TaskMetadata, TaskStatus, TaskType,
    },
    ports::{AgentExecutionRepository, TaskRepository, TaskRepositoryError},
};
use crate::telemetry::task_span;
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, error, info, warn};

/// Request payload for submitting a task.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTaskRequest {
    /// Kind of work requested.
    pub task_type: TaskType,
    /// Free-text description.
    pub description: String,
    /// Query or subject to optimise.
    pub target_query: String,
    /// Arbitrary metadata used for routing.
    pub metadata: TaskMetadata,
}

impl SubmitTaskRequest {
    /// Creates a request without metadata.
    #[must_use]
    pub fn new(
        task_type: TaskType,
        description: impl Into<String>,
        target_query: impl Into<String>,
    ) -> Self {
        Self {
            task_type,
            description: description.into(),
            target_query: target_query.into(),
            metadata: TaskMetadata::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Repositories the processor persists through.
#[derive(Clone)]
pub struct ProcessorRepositories {
    /// Tasks.
    pub tasks: Arc<dyn TaskRepository>,
    /// Worker execution records.
    pub executions: Arc<dyn AgentExecutionRepository>,
    /// Proposals.
    pub proposals: Arc<dyn ProposalRepository>,
    /// Benchmark results.
    pub benchmarks: Arc<dyn BenchmarkRepository>,
    /// Consensus decisions.
    pub decisions: Arc<dyn ConsensusRepository>,
}

impl ProcessorRepositories {
    /// Builds a set of empty in-memory repositories.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            tasks: Arc::new(InMemoryTaskRepository::new()),
            executions: Arc::new(InMemoryAgentExecutionRepository::new()),
            proposals: Arc::new(InMemoryProposalRepository::new()),
            benchmarks: Arc::new(InMemoryBenchmarkRepository::new()),
            decisions: Arc::new(InMemoryConsensusRepository::new()),
        }
    }
}

impl std::fmt::Debug for ProcessorRepositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRepositories").finish_non_exhaustive()
    }
}

/// Everything produced by a successful [`TaskProcessor::process_task`] run.
#[derive(Debug, Clone)]
pub struct ProcessedTask {
    /// The completed task.
    pub task: Task,
    /// The stored decision.
    pub decision: ConsensusDecision,
    /// Stored proposals with their score breakdowns.
    pub proposals: Vec<OptimizationProposal>,
    /// Stored benchmarks, linked to durable proposal identities.
    pub benchmarks: Vec<BenchmarkResult>,
    /// Execution records in their final state.
    pub executions: Vec<AgentExecution>,
    /// Outcome of releasing the isolated copies.
    pub cleanup: CleanupReport,
}

/// Errors returned by [`TaskProcessor`].
#[derive(Debug, Clone, Error)]
pub enum TaskProcessorError {
    /// No task has the given identifier.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    /// Not a single worker could be dispatched.
    #[error("no workers could be dispatched for task {0}")]
    NoWorkersDispatched(TaskId),
    /// The winning proposal is missing from the run's proposals.
    #[error("winning proposal {0} is not part of this run")]
    ProposalNotFound(ProposalId),
    /// Task or execution validation failed.
    #[error(transparent)]
    TaskDomain(#[from] TaskDomainError),
    /// Decision validation failed.
    #[error(transparent)]
    ConsensusDomain(#[from] ConsensusDomainError),
    /// Task or execution persistence failed.
    #[error(transparent)]
    TaskRepository(#[from] TaskRepositoryError),
    /// Proposal or benchmark persistence failed.
    #[error(transparent)]
    ProposalRepository(#[from] ProposalRepositoryError),
    /// Decision persistence failed.
    #[error(transparent)]
    ConsensusRepository(#[from] ConsensusRepositoryError),
    /// A worker could not be built.
    #[error(transparent)]
    Worker(#[from] WorkerError),
    /// Fan-out, apply or resource failure.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    /// Scoring failed.
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Result type for task processor operations.
pub type TaskProcessorResult<T> = Result<T, TaskProcessorError>;

#[derive(Debug, Default)]
struct RunState {
    copies: Vec<ResourceCopyId>,
    executions: Vec<AgentExecution>,
}

#[derive(Debug)]
struct PipelineOutput {
    decision: ConsensusDecision,
    proposals: Vec<OptimizationProposal>,
    benchmarks: Vec<BenchmarkResult>,
}

/// Drives tasks through `pending -> in_progress -> {completed, failed}`.
///
/// Processing one task is sequential. Callers must not process the same
/// task concurrently; different tasks are independent.
pub struct TaskProcessor<C, L>
where
    C: Clock + Send + Sync,
    L: ResourceLifecycle + 'static,
{
    repositories: ProcessorRepositories,
    workers: Arc<dyn WorkerFactory>,
    events: EventHub,
    config: OrchestrationConfig,
    selector: AgentSelector,
    engine: ConsensusEngine<C>,
    orchestrator: ParallelOrchestrator<L>,
    clock: Arc<C>,
}

impl<C, L> TaskProcessor<C, L>
where
    C: Clock + Send + Sync,
    L: ResourceLifecycle + 'static,
{
    /// Creates a processor.
    #[must_use]
    pub fn new(
        repositories: ProcessorRepositories,
        workers: Arc<dyn WorkerFactory>,
        resources: Arc<L>,
        events: EventHub,
        config: OrchestrationConfig,
        clock: Arc<C>,
    ) -> Self {
        let orchestrator = ParallelOrchestrator::new(resources)
            .with_worker_timeout(config.worker_timeout())
            .with_statement_timeout_ms(config.statement_timeout_ms);
        Self {
            repositories,
            workers,
            events,
            config,
            selector: AgentSelector::new(),
            engine: ConsensusEngine::new(Arc::clone(&clock)),
            orchestrator,
            clock,
        }
    }

    /// Returns the event hub the processor reports to.
    #[must_use]
    pub const fn events(&self) -> &EventHub {
        &self.events
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    /// Validates and stores a new pending task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskProcessorError::TaskDomain`] when validation fails or
    /// [`TaskProcessorError::TaskRepository`] when persistence fails.
    pub async fn submit(&self, request: SubmitTaskRequest) -> TaskProcessorResult<Task> {
        let mut task = Task::new(
            request.task_type,
            request.description,
            request.target_query,
            request.metadata,
            &*self.clock,
        )?;
        let task_id = self.repositories.tasks.create(&task).await?;
        task.assign_id(task_id);
        info!(task = %task_id, task_type = %task.task_type(), "task submitted");

        self.emit(
            Event::new(EventType::TaskCreated)
                .with("task_id", task_id.value())
                .with("task_type", task.task_type().as_str())
                .with("status", task.status().as_str()),
        )
        .await;
        Ok(task)
    }

    /// Runs a pending task to completion.
    ///
    /// Workers are chosen, given isolated copies and run in parallel. Their
    /// proposals and benchmarks are stored, scored, and the decision is
    /// recorded (and applied when configured). Copies are always released
    /// once created. Any failure after the task has started marks it failed
    /// and emits `task_failed`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskProcessorError::TaskNotFound`] for an unknown task,
    /// [`TaskProcessorError::TaskDomain`] when the task cannot start, and any
    /// error that failed the task.
    pub async fn process_task(&self, task_id: TaskId) -> TaskProcessorResult<ProcessedTask> {
        self.process(task_id)
            .instrument(task_span("process_task", task_id))
            .await
    }

    async fn process(&self, task_id: TaskId) -> TaskProcessorResult<ProcessedTask> {
        let mut task = self
            .repositories
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(TaskProcessorError::TaskNotFound(task_id))?;
        task.transition_to(TaskStatus::InProgress, &*self.clock)?;
        self.repositories.tasks.update(&task).await?;
        self.emit(
            Event::new(EventType::AgentsAssigned)
                .with("task_id", task_id.value())
                .with("status", "routing"),
        )
        .await;

        let mut state = RunState::default();
        let outcome = self.run_pipeline(&task, &mut state).await;

        let cleanup = self.orchestrator.cleanup_copies(&state.copies).await;
        if let Some(err) = cleanup.first_error() {
            warn!(
                task = %task_id,
                failed = cleanup.failures.len(),
                error = %err,
                "some copies were not released"
            );
        }

        let result = match outcome {
            Ok(output) => self.complete(&mut task, output, state.executions, cleanup).await,
            Err(err) => {
                self.abandon_executions(&mut state.executions, &err).await;
                Err(err)
            }
        };
        if let Err(err) = &result {
            self.fail(&mut task, err).await;
        }
        result
    }

    async fn run_pipeline(
        &self,
        task: &Task,
        state: &mut RunState,
    ) -> TaskProcessorResult<PipelineOutput> {
        let agents = self.engaged_agents(task);
        let assignments = self.dispatch_workers(task, &agents, state).await?;
        self.emit(
            Event::new(EventType::AnalysisCompleted)
                .with("task_id", task.id().value())
                .with("status", "executing")
                .with("agents", assignments.len()),
        )
        .await;

        let run = match self.orchestrator.execute_in_parallel(task, assignments).await {
            Ok(run) => run,
            Err(err) => {
                if let OrchestratorError::AllWorkersFailed { failures, .. } = &err {
                    self.record_failures(&mut state.executions, failures).await;
                }
                return Err(err.into());
            }
        };
        self.record_failures(&mut state.executions, &run.failures).await;

        let ParallelRun {
            mut proposals,
            mut benchmarks,
            ..
        } = run;
        self.persist_results(task, &mut proposals, &mut benchmarks)
            .await?;
        self.emit(
            Event::new(EventType::BenchmarkCompleted)
                .with("task_id", task.id().value())
                .with("proposals", proposals.len()),
        )
        .await;
        self.complete_executions(&mut state.executions, &proposals)
            .await?;

        let mut decision = self
            .engine
            .decide(&proposals, &benchmarks, &self.config.scoring)?;
        self.attach_scores(&mut proposals, &decision).await;

        decision.bind_to_task(task.id())?;
        let decision_id = self.repositories.decisions.create(&decision).await?;
        decision.assign_id(decision_id);
        info!(
            task = %task.id(),
            winner = ?decision.winning_proposal_id().map(ProposalId::value),
            "consensus reached"
        );
        self.emit(
            Event::new(EventType::ConsensusReached)
                .with("task_id", task.id().value())
                .with(
                    "winning_proposal_id",
                    decision.winning_proposal_id().map(ProposalId::value),
                ),
        )
        .await;

        if self.config.apply_winner {
            self.apply_winner(task, &mut decision, &proposals).await?;
        }

        Ok(PipelineOutput {
            decision,
            proposals,
            benchmarks,
        })
    }

    fn engaged_agents(&self, task: &Task) -> Vec<AgentType> {
        match self.config.worker_selection {
            WorkerSelection::All => AgentType::CANONICAL.to_vec(),
            WorkerSelection::Routed => {
                let selection = self.selector.select(task);
                info!(task = %task.id(), rationale = %selection.rationale, "workers routed");
                selection.agents
            }
        }
    }

    async fn dispatch_workers(
        &self,
        task: &Task,
        agents: &[AgentType],
        state: &mut RunState,
    ) -> TaskProcessorResult<Vec<WorkerAssignment>> {
        let mut assignments = Vec::with_capacity(agents.len());
        for &agent_type in agents {
            let worker = self.workers.create(agent_type)?;
            let copy_id = match self
                .orchestrator
                .provision_copy(&self.config.main_target, agent_type, task.id())
                .await
            {
                Ok(copy_id) => copy_id,
                Err(err) => {
                    warn!(task = %task.id(), agent = %agent_type, error = %err, "skipping worker without a copy");
                    continue;
                }
            };
            state.copies.push(copy_id.clone());

            let mut execution =
                AgentExecution::start(task.id(), agent_type, copy_id.clone(), &*self.clock)?;
            let execution_id = self.repositories.executions.create(&execution).await?;
            execution.assign_id(execution_id);
            state.executions.push(execution);

            self.emit(
                Event::new(EventType::ForkCreated)
                    .with("task_id", task.id().value())
                    .with("agent_type", agent_type.as_str())
                    .with("fork_id", copy_id.as_str())
                    .with("execution_id", execution_id.value()),
            )
            .await;
            assignments.push(WorkerAssignment {
                worker,
                copy_id,
                execution_id,
            });
        }

        if assignments.is_empty() {
            return Err(TaskProcessorError::NoWorkersDispatched(task.id()));
        }
        Ok(assignments)
    }

    async fn record_failures(&self, executions: &mut [AgentExecution], failures: &[WorkerFailure]) {
        for failure in failures {
            let Some(execution) = executions
                .iter_mut()
                .find(|execution| execution.id() == failure.execution_id)
            else {
                continue;
            };
            self.fail_execution(execution, &failure.error.to_string())
                .await;
        }
    }

    async fn abandon_executions(
        &self,
        executions: &mut [AgentExecution],
        cause: &TaskProcessorError,
    ) {
        let reason = cause.to_string();
        for execution in executions
            .iter_mut()
            .filter(|execution| !execution.is_terminal())
        {
            self.fail_execution(execution, &reason).await;
        }
    }

    async fn fail_execution(&self, execution: &mut AgentExecution, reason: &str) {
        if let Err(err) = execution.mark_failed(reason) {
            warn!(execution = %execution.id(), error = %err, "cannot mark execution failed");
            return;
        }
        if let Err(err) = self.repositories.executions.update(execution).await {
            warn!(execution = %execution.id(), error = %err, "failed to persist execution failure");
        }
    }

    async fn persist_results(
        &self,
        task: &Task,
        proposals: &mut [OptimizationProposal],
        benchmarks: &mut [BenchmarkResult],
    ) -> TaskProcessorResult<()> {
        for proposal in proposals.iter_mut() {
            let provisional = proposal.id();
            let durable = self.repositories.proposals.create(proposal).await?;
            proposal.assign_id(durable);
            for benchmark in benchmarks
                .iter_mut()
                .filter(|benchmark| benchmark.proposal_id() == provisional)
            {
                benchmark.reassign_proposal(durable);
            }

            self.emit(
                Event::new(EventType::ProposalSubmitted)
                    .with("task_id", task.id().value())
                    .with("proposal_id", durable.value())
                    .with("agent_type", proposal.agent_type().map(AgentType::as_str))
                    .with("proposal_type", proposal.proposal_type().as_str()),
            )
            .await;
        }

        for benchmark in benchmarks.iter_mut() {
            let benchmark_id = self.repositories.benchmarks.create(benchmark).await?;
            benchmark.assign_id(benchmark_id);
        }
        Ok(())
    }

    async fn complete_executions(
        &self,
        executions: &mut [AgentExecution],
        proposals: &[OptimizationProposal],
    ) -> TaskProcessorResult<()> {
        let delivered: HashSet<AgentExecutionId> = proposals
            .iter()
            .filter_map(OptimizationProposal::agent_execution_id)
            .collect();
        for execution in executions
            .iter_mut()
            .filter(|execution| delivered.contains(&execution.id()) && !execution.is_terminal())
        {
            execution.mark_completed(&*self.clock)?;
            self.repositories.executions.update(execution).await?;
        }
        Ok(())
    }

    async fn attach_scores(
        &self,
        proposals: &mut [OptimizationProposal],
        decision: &ConsensusDecision,
    ) {
        for proposal in proposals.iter_mut() {
            let Some(score) = decision.score_for_proposal(proposal.id()) else {
                continue;
            };
            proposal.attach_score_breakdown(score.breakdown());
            if let Err(err) = self.repositories.proposals.update(proposal).await {
                warn!(proposal = %proposal.id(), error = %err, "failed to store score breakdown");
            }
        }
    }

    async fn apply_winner(
        &self,
        task: &Task,
        decision: &mut ConsensusDecision,
        proposals: &[OptimizationProposal],
    ) -> TaskProcessorResult<()> {
        let Some(winner_id) = decision.winning_proposal_id() else {
            return Ok(());
        };
        let winner = proposals
            .iter()
            .find(|proposal| proposal.id() == winner_id)
            .ok_or(TaskProcessorError::ProposalNotFound(winner_id))?;

        let applied = self
            .orchestrator
            .apply_to_main(&self.config.main_target, winner)
            .await?;
        decision.mark_applied()?;
        self.repositories.decisions.update(decision).await?;

        self.emit(
            Event::new(EventType::OptimizationApplied)
                .with("task_id", task.id().value())
                .with("proposal_id", winner_id.value())
                .with("target", self.config.main_target.as_str())
                .with("statements", applied),
        )
        .await;
        Ok(())
    }

    async fn complete(
        &self,
        task: &mut Task,
        output: PipelineOutput,
        executions: Vec<AgentExecution>,
        cleanup: CleanupReport,
    ) -> TaskProcessorResult<ProcessedTask> {
        let mut completed = task.clone();
        completed.transition_to(TaskStatus::Completed, &*self.clock)?;
        self.repositories.tasks.update(&completed).await?;
        *task = completed;

        let winner = output.decision.winning_proposal_id().map(ProposalId::value);
        info!(task = %task.id(), winner = ?winner, "task completed");
        self.emit(
            Event::new(EventType::TaskCompleted)
                .with("task_id", task.id().value())
                .with("status", task.status().as_str())
                .with("winning_proposal_id", winner)
                .with(
                    "completed_at",
                    task.completed_at().map(|at| at.to_rfc3339()),
                ),
        )
        .await;

        Ok(ProcessedTask {
            task: task.clone(),
            decision: output.decision,
            proposals: output.proposals,
            benchmarks: output.benchmarks,
            executions,
            cleanup,
        })
    }

    async fn fail(&self, task: &mut Task, cause: &TaskProcessorError) {
        let reason = cause.to_string();
        error!(task = %task.id(), error = %reason, "task failed");

        if task.status().can_transition_to(TaskStatus::Failed) {
            match task.transition_to(TaskStatus::Failed, &*self.clock) {
                Ok(()) => {
                    if let Err(err) = self.repositories.tasks.update(task).await {
                        warn!(task = %task.id(), error = %err, "failed to persist task failure");
                    }
                }
                Err(err) => warn!(task = %task.id(), error = %err, "cannot mark task failed"),
            }
        }

        self.emit(
            Event::new(EventType::TaskFailed)
                .with("task_id", task.id().value())
                .with("status", TaskStatus::Failed.as_str())
                .with("error", reason),
        )
        .await;
    }

    async fn emit(&self, event: Event) {
        if let Err(err) = self.events.broadcast(&event).await {
            warn!(event = %event.event_type, error = %err, "failed to broadcast event");
        }
    }
}
