//! Deterministic workers driven by a fixed script.
//!
//! Useful for local runs and tests where real workers are not available.

use crate::orchestration::ports::{
    AnalysisResult, Worker, WorkerError, WorkerFactory, WorkerResult, WorkerStep,
};
use crate::proposal::domain::{
    BenchmarkMeasurement, BenchmarkQueryName, BenchmarkResult, EstimatedImpact, ExplainPlan,
    ImpactLevel, OptimizationProposal, ProposalType,
};
use crate::task::domain::{AgentType, ResourceCopyId, Task};
use async_trait::async_trait;
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// What a [`ScriptedWorker`] proposes and measures.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerScript {
    /// Kind of change proposed.
    pub proposal_type: ProposalType,
    /// Statements proposed.
    pub statements: Vec<String>,
    /// Rationale given for the proposal.
    pub rationale: String,
    /// Estimated impact reported with the proposal.
    pub impact: EstimatedImpact,
    /// Baseline execution time in milliseconds.
    pub baseline_ms: f64,
    /// Execution time after the change, in milliseconds.
    pub optimized_ms: f64,
    /// Storage used by the change, in MB.
    pub storage_impact_mb: f64,
    /// Query text reported for each measurement.
    pub benchmark_query: String,
    /// Step that reports a failure, if any.
    pub fail_at: Option<WorkerStep>,
    /// Pause before each step.
    pub delay: Option<Duration>,
}

impl WorkerScript {
    /// Scripts a single-index proposal that halves a 100 ms baseline.
    #[must_use]
    pub fn index(statement: impl Into<String>) -> Self {
        Self {
            proposal_type: ProposalType::Index,
            statements: vec![statement.into()],
            rationale: "index the filtered column".to_owned(),
            impact: EstimatedImpact::new(50.0, 10.0, ImpactLevel::Low, ImpactLevel::Low),
            baseline_ms: 100.0,
            optimized_ms: 50.0,
            storage_impact_mb: 10.0,
            benchmark_query: "SELECT * FROM orders WHERE status = 'open'".to_owned(),
            fail_at: None,
            delay: None,
        }
    }

    /// Sets the proposal kind.
    #[must_use]
    pub const fn with_type(mut self, proposal_type: ProposalType) -> Self {
        self.proposal_type = proposal_type;
        self
    }

    /// Sets the impact estimate.
    #[must_use]
    pub fn with_impact(mut self, impact: EstimatedImpact) -> Self {
        self.impact = impact;
        self
    }

    /// Sets the measured baseline and optimised timings.
    #[must_use]
    pub const fn with_timings(mut self, baseline_ms: f64, optimized_ms: f64) -> Self {
        self.baseline_ms = baseline_ms;
        self.optimized_ms = optimized_ms;
        self
    }

    /// Makes `step` fail.
    #[must_use]
    pub const fn failing_at(mut self, step: WorkerStep) -> Self {
        self.fail_at = Some(step);
        self
    }

    /// Pauses before each step.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A worker replaying a [`WorkerScript`].
#[derive(Debug)]
pub struct ScriptedWorker<C>
where
    C: Clock + Send + Sync,
{
    agent_type: AgentType,
    script: WorkerScript,
    clock: Arc<C>,
}

impl<C> ScriptedWorker<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a worker playing `agent_type`.
    #[must_use]
    pub const fn new(agent_type: AgentType, script: WorkerScript, clock: Arc<C>) -> Self {
        Self {
            agent_type,
            script,
            clock,
        }
    }

    async fn step(&self, step: WorkerStep) -> WorkerResult<()> {
        if let Some(delay) = self.script.delay {
            tokio::time::sleep(delay).await;
        }
        if self.script.fail_at == Some(step) {
            return Err(WorkerError::Step {
                step,
                reason: format!("{} scripted failure", self.agent_type),
            });
        }
        Ok(())
    }

    fn measure(
        &self,
        proposal: &OptimizationProposal,
        query_name: BenchmarkQueryName,
    ) -> WorkerResult<BenchmarkResult> {
        let (elapsed, plan) = if query_name.is_baseline() {
            (self.script.baseline_ms, ExplainPlan::of_type("Seq Scan"))
        } else {
            (
                self.script.optimized_ms,
                ExplainPlan::of_type("Index Scan").with_index_name(format!(
                    "idx_{}_{}",
                    self.agent_type,
                    proposal.proposal_type()
                )),
            )
        };
        BenchmarkResult::new(
            BenchmarkMeasurement {
                proposal_id: proposal.id(),
                query_name,
                query_executed: self.script.benchmark_query.clone(),
                execution_time_ms: elapsed,
                rows_returned: 1,
                explain_plan: plan,
                storage_impact_mb: self.script.storage_impact_mb,
            },
            &*self.clock,
        )
        .map_err(|err| WorkerError::benchmark(err.to_string()))
    }
}

#[async_trait]
impl<C> Worker for ScriptedWorker<C>
where
    C: Clock + Send + Sync,
{
    fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    async fn analyze_task(
        &self,
        task: &Task,
        _copy_id: &ResourceCopyId,
    ) -> WorkerResult<AnalysisResult> {
        self.step(WorkerStep::Analyze).await?;
        Ok(AnalysisResult {
            insights: vec![task.target_query().trim().to_owned()],
            issues: Vec::new(),
            focus: vec![self.script.proposal_type.as_str().to_owned()],
        })
    }

    async fn propose_optimization(
        &self,
        analysis: &AnalysisResult,
        _copy_id: &ResourceCopyId,
    ) -> WorkerResult<OptimizationProposal> {
        self.step(WorkerStep::Propose).await?;
        tracing::debug!(agent = %self.agent_type, focus = ?analysis.focus, "drafting proposal");
        OptimizationProposal::new(
            self.script.proposal_type,
            self.script.statements.clone(),
            self.script.rationale.clone(),
            self.script.impact.clone(),
            &*self.clock,
        )
        .map_err(|err| WorkerError::propose(err.to_string()))
    }

    async fn run_benchmark(
        &self,
        proposal: &OptimizationProposal,
        _copy_id: &ResourceCopyId,
    ) -> WorkerResult<Vec<BenchmarkResult>> {
        self.step(WorkerStep::Benchmark).await?;
        [BenchmarkQueryName::Baseline, BenchmarkQueryName::TestFilter]
            .into_iter()
            .map(|name| self.measure(proposal, name))
            .collect()
    }
}

/// Builds [`ScriptedWorker`]s from a script per role.
///
/// Roles without a script are reported as unavailable.
#[derive(Debug)]
pub struct ScriptedWorkerFactory<C>
where
    C: Clock + Send + Sync,
{
    scripts: BTreeMap<AgentType, WorkerScript>,
    clock: Arc<C>,
}

impl<C> ScriptedWorkerFactory<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a factory without scripts.
    #[must_use]
    pub const fn new(clock: Arc<C>) -> Self {
        Self {
            scripts: BTreeMap::new(),
            clock,
        }
    }

    /// Scripts the worker built for `agent_type`.
    #[must_use]
    pub fn with_script(mut self, agent_type: AgentType, script: WorkerScript) -> Self {
        self.scripts.insert(agent_type, script);
        self
    }
}

impl<C> WorkerFactory for ScriptedWorkerFactory<C>
where
    C: Clock + Send + Sync + 'static,
{
    fn create(&self, agent_type: AgentType) -> WorkerResult<Arc<dyn Worker>> {
        let script = self
            .scripts
            .get(&agent_type)
            .cloned()
            .ok_or_else(|| WorkerError::Unavailable {
                agent_type,
                reason: "no script registered".to_owned(),
            })?;
        Ok(Arc::new(ScriptedWorker::new(
            agent_type,
            script,
            Arc::clone(&self.clock),
        )))
    }
}
