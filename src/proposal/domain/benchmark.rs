//! Measured benchmark runs used as scoring evidence.

use super::{BenchmarkId, ParseBenchmarkQueryNameError, ProposalDomainError, ProposalId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a test query in the benchmark suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkQueryName {
    /// The unmodified query before the proposal is applied.
    Baseline,
    /// The query with a row limit.
    TestLimit,
    /// The query with an extra filter.
    TestFilter,
    /// The query with an ordering.
    TestSort,
}

impl BenchmarkQueryName {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::TestLimit => "test_limit",
            Self::TestFilter => "test_filter",
            Self::TestSort => "test_sort",
        }
    }

    /// Returns whether this is the unoptimised reference measurement.
    #[must_use]
    pub const fn is_baseline(self) -> bool {
        matches!(self, Self::Baseline)
    }
}

impl fmt::Display for BenchmarkQueryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BenchmarkQueryName {
    type Error = ParseBenchmarkQueryNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(Self::Baseline),
            "test_limit" => Ok(Self::TestLimit),
            "test_filter" => Ok(Self::TestFilter),
            "test_sort" => Ok(Self::TestSort),
            _ => Err(ParseBenchmarkQueryNameError(value.to_owned())),
        }
    }
}

/// Buffer usage reported by the execution plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferUsage {
    /// Shared buffer hits.
    pub shared_hit: u64,
    /// Shared buffer reads.
    pub shared_read: u64,
}

/// Structured summary of a query execution plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplainPlan {
    /// Planning time in milliseconds.
    pub planning_time_ms: f64,
    /// Execution time in milliseconds.
    pub execution_time_ms: f64,
    /// Planner total cost.
    pub total_cost: f64,
    /// Rows produced by the root node.
    pub actual_rows: u64,
    /// Root node type, e.g. `Seq Scan` or `Index Scan`.
    pub plan_type: String,
    /// Index used by the root node, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    /// Rows discarded by filters.
    pub filter_removed_rows: u64,
    /// Sort method, if the plan sorts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_method: Option<String>,
    /// Buffer usage.
    pub buffers: BufferUsage,
    /// Full plan document as returned by the database.
    #[serde(default)]
    pub full_plan: String,
}

impl ExplainPlan {
    /// Creates a plan summary with only the plan type set.
    #[must_use]
    pub fn of_type(plan_type: impl Into<String>) -> Self {
        Self {
            plan_type: plan_type.into(),
            ..Self::default()
        }
    }

    /// Sets the index used by the root node.
    #[must_use]
    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }
}

/// Raw measurement reported by a worker, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkMeasurement {
    /// Proposal this measurement belongs to.
    pub proposal_id: ProposalId,
    /// Test name.
    pub query_name: BenchmarkQueryName,
    /// SQL text that was executed.
    pub query_executed: String,
    /// Measured execution time in milliseconds.
    pub execution_time_ms: f64,
    /// Rows returned by the query.
    pub rows_returned: u64,
    /// Execution plan summary.
    pub explain_plan: ExplainPlan,
    /// Storage impact estimate in MB.
    pub storage_impact_mb: f64,
}

/// One measured run of a named test query against a candidate state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    id: BenchmarkId,
    proposal_id: ProposalId,
    query_name: BenchmarkQueryName,
    query_executed: String,
    execution_time_ms: f64,
    rows_returned: u64,
    explain_plan: ExplainPlan,
    storage_impact_mb: f64,
    created_at: DateTime<Utc>,
}

impl BenchmarkResult {
    /// Validates a measurement and stamps it with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalDomainError`] when the query text is blank, the
    /// execution time is not positive, the storage impact is negative, or the
    /// plan summary has no plan type.
    pub fn new(
        measurement: BenchmarkMeasurement,
        clock: &impl Clock,
    ) -> Result<Self, ProposalDomainError> {
        if measurement.query_executed.trim().is_empty() {
            return Err(ProposalDomainError::EmptyQueryExecuted);
        }
        let elapsed = measurement.execution_time_ms;
        if !(elapsed.is_finite() && elapsed > 0.0) {
            return Err(ProposalDomainError::NonPositiveExecutionTime(elapsed));
        }
        let storage = measurement.storage_impact_mb;
        if storage.is_nan() || storage < 0.0 {
            return Err(ProposalDomainError::NegativeStorageImpact(storage));
        }
        if measurement.explain_plan.plan_type.trim().is_empty() {
            return Err(ProposalDomainError::EmptyPlanType);
        }

        Ok(Self {
            id: BenchmarkId::UNASSIGNED,
            proposal_id: measurement.proposal_id,
            query_name: measurement.query_name,
            query_executed: measurement.query_executed,
            execution_time_ms: elapsed,
            rows_returned: measurement.rows_returned,
            explain_plan: measurement.explain_plan,
            storage_impact_mb: storage,
            created_at: clock.utc(),
        })
    }

    /// Records the durable identity assigned by a repository.
    pub const fn assign_id(&mut self, id: BenchmarkId) {
        self.id = id;
    }

    /// Points the result at a different proposal identity.
    pub const fn reassign_proposal(&mut self, proposal_id: ProposalId) {
        self.proposal_id = proposal_id;
    }

    /// Returns the result identifier.
    #[must_use]
    pub const fn id(&self) -> BenchmarkId {
        self.id
    }

    /// Returns the owning proposal.
    #[must_use]
    pub const fn proposal_id(&self) -> ProposalId {
        self.proposal_id
    }

    /// Returns the test name.
    #[must_use]
    pub const fn query_name(&self) -> BenchmarkQueryName {
        self.query_name
    }

    /// Returns the executed SQL text.
    #[must_use]
    pub fn query_executed(&self) -> &str {
        &self.query_executed
    }

    /// Returns the measured execution time in milliseconds.
    #[must_use]
    pub const fn execution_time_ms(&self) -> f64 {
        self.execution_time_ms
    }

    /// Returns the rows returned by the query.
    #[must_use]
    pub const fn rows_returned(&self) -> u64 {
        self.rows_returned
    }

    /// Returns the execution plan summary.
    #[must_use]
    pub const fn explain_plan(&self) -> &ExplainPlan {
        &self.explain_plan
    }

    /// Returns the storage impact estimate in MB.
    #[must_use]
    pub const fn storage_impact_mb(&self) -> f64 {
        self.storage_impact_mb
    }

    /// Returns the measurement timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns whether this run was strictly faster than `other`.
    #[must_use]
    pub fn is_faster_than(&self, other: &Self) -> bool {
        self.execution_time_ms < other.execution_time_ms
    }

    /// Returns execution milliseconds per MB of storage impact.
    ///
    /// Returns `0.0` when the storage impact is zero.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "ratio of two measured quantities"
    )]
    pub fn efficiency_ratio(&self) -> f64 {
        if self.storage_impact_mb == 0.0 {
            return 0.0;
        }
        self.execution_time_ms / self.storage_impact_mb
    }
}
