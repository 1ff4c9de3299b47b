//! Optimisation proposal aggregate and its impact estimate.

use super::{ParseImpactLevelError, ParseProposalTypeError, ProposalDomainError, ProposalId};
use crate::task::domain::{AgentExecutionId, AgentType};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of change a proposal makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalType {
    /// Single-column index.
    Index,
    /// Index with a predicate.
    PartialIndex,
    /// Multi-column index.
    CompositeIndex,
    /// Precomputed materialized view.
    MaterializedView,
    /// Table partitioning.
    Partitioning,
    /// Denormalised columns or tables.
    Denormalization,
    /// Rewritten query text.
    QueryRewrite,
}

impl ProposalType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::PartialIndex => "partial_index",
            Self::CompositeIndex => "composite_index",
            Self::MaterializedView => "materialized_view",
            Self::Partitioning => "partitioning",
            Self::Denormalization => "denormalization",
            Self::QueryRewrite => "query_rewrite",
        }
    }
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProposalType {
    type Error = ParseProposalTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "index" => Ok(Self::Index),
            "partial_index" => Ok(Self::PartialIndex),
            "composite_index" => Ok(Self::CompositeIndex),
            "materialized_view" => Ok(Self::MaterializedView),
            "partitioning" => Ok(Self::Partitioning),
            "denormalization" => Ok(Self::Denormalization),
            "query_rewrite" => Ok(Self::QueryRewrite),
            _ => Err(ParseProposalTypeError(value.to_owned())),
        }
    }
}

/// Qualitative rating used for complexity and risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
}

impl ImpactLevel {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ImpactLevel {
    type Error = ParseImpactLevelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseImpactLevelError(value.to_owned())),
        }
    }
}

/// Expected effect of applying a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedImpact {
    /// Expected query time improvement, in percent.
    pub query_time_improvement_pct: f64,
    /// Additional storage the change needs, in MB.
    pub storage_overhead_mb: f64,
    /// Implementation complexity.
    pub complexity: ImpactLevel,
    /// Operational risk.
    pub risk: ImpactLevel,
    /// Optional free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl EstimatedImpact {
    /// Creates an impact estimate without notes.
    #[must_use]
    pub const fn new(
        query_time_improvement_pct: f64,
        storage_overhead_mb: f64,
        complexity: ImpactLevel,
        risk: ImpactLevel,
    ) -> Self {
        Self {
            query_time_improvement_pct,
            storage_overhead_mb,
            complexity,
            risk,
            notes: None,
        }
    }

    /// Attaches free-text notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Per-criterion scores attached to a proposal after consensus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Performance sub-score (0-100).
    pub performance: f64,
    /// Storage sub-score (0-100).
    pub storage: f64,
    /// Complexity sub-score (0-100).
    pub complexity: f64,
    /// Risk sub-score (0-100).
    pub risk: f64,
    /// Weighted total across all criteria.
    pub weighted_total: f64,
}

/// A worker's proposed change.
///
/// Immutable once benchmarked, apart from identity assignment and the
/// attached score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationProposal {
    id: ProposalId,
    agent_execution_id: Option<AgentExecutionId>,
    agent_type: Option<AgentType>,
    proposal_type: ProposalType,
    statements: Vec<String>,
    rationale: String,
    estimated_impact: EstimatedImpact,
    score_breakdown: Option<ScoreBreakdown>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedProposalData {
    /// Persisted proposal identifier.
    pub id: ProposalId,
    /// Owning execution.
    pub agent_execution_id: Option<AgentExecutionId>,
    /// Role of the worker that proposed the change.
    pub agent_type: Option<AgentType>,
    /// Proposal kind.
    pub proposal_type: ProposalType,
    /// Statements to apply, in order.
    pub statements: Vec<String>,
    /// Worker rationale.
    pub rationale: String,
    /// Impact estimate.
    pub estimated_impact: EstimatedImpact,
    /// Attached score breakdown, if scored.
    pub score_breakdown: Option<ScoreBreakdown>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl OptimizationProposal {
    /// Creates a validated proposal.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalDomainError`] when there are no statements, a
    /// statement or the rationale is blank, the estimated improvement is
    /// zero or not finite, or the storage overhead is not finite.
    pub fn new(
        proposal_type: ProposalType,
        statements: impl IntoIterator<Item = String>,
        rationale: impl Into<String>,
        estimated_impact: EstimatedImpact,
        clock: &impl Clock,
    ) -> Result<Self, ProposalDomainError> {
        let collected: Vec<String> = statements.into_iter().collect();
        if collected.is_empty() {
            return Err(ProposalDomainError::NoStatements);
        }
        if let Some(index) = collected
            .iter()
            .position(|statement| statement.trim().is_empty())
        {
            return Err(ProposalDomainError::EmptyStatement { index });
        }

        let rationale_text = rationale.into();
        if rationale_text.trim().is_empty() {
            return Err(ProposalDomainError::EmptyRationale);
        }

        let improvement = estimated_impact.query_time_improvement_pct;
        if improvement == 0.0 || !improvement.is_finite() {
            return Err(ProposalDomainError::InvalidEstimatedImprovement(
                improvement,
            ));
        }
        let overhead = estimated_impact.storage_overhead_mb;
        if !overhead.is_finite() {
            return Err(ProposalDomainError::InvalidStorageOverhead(overhead));
        }

        Ok(Self {
            id: ProposalId::UNASSIGNED,
            agent_execution_id: None,
            agent_type: None,
            proposal_type,
            statements: collected,
            rationale: rationale_text,
            estimated_impact,
            score_breakdown: None,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a proposal from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedProposalData) -> Self {
        Self {
            id: data.id,
            agent_execution_id: data.agent_execution_id,
            agent_type: data.agent_type,
            proposal_type: data.proposal_type,
            statements: data.statements,
            rationale: data.rationale,
            estimated_impact: data.estimated_impact,
            score_breakdown: data.score_breakdown,
            created_at: data.created_at,
        }
    }

    /// Records a provisional or durable identity.
    pub const fn assign_id(&mut self, id: ProposalId) {
        self.id = id;
    }

    /// Records which worker, and which execution, produced this proposal.
    pub const fn attribute_to(&mut self, agent_type: AgentType, execution_id: AgentExecutionId) {
        self.agent_type = Some(agent_type);
        self.agent_execution_id = Some(execution_id);
    }

    /// Attaches the score breakdown computed by consensus.
    pub const fn attach_score_breakdown(&mut self, breakdown: ScoreBreakdown) {
        self.score_breakdown = Some(breakdown);
    }

    /// Returns the proposal identifier.
    #[must_use]
    pub const fn id(&self) -> ProposalId {
        self.id
    }

    /// Returns the owning execution, once attributed.
    #[must_use]
    pub const fn agent_execution_id(&self) -> Option<AgentExecutionId> {
        self.agent_execution_id
    }

    /// Returns the proposing worker's role, once attributed.
    #[must_use]
    pub const fn agent_type(&self) -> Option<AgentType> {
        self.agent_type
    }

    /// Returns the proposal kind.
    #[must_use]
    pub const fn proposal_type(&self) -> ProposalType {
        self.proposal_type
    }

    /// Returns the statements to apply, in order.
    #[must_use]
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Returns the worker's rationale.
    #[must_use]
    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    /// Returns the impact estimate.
    #[must_use]
    pub const fn estimated_impact(&self) -> &EstimatedImpact {
        &self.estimated_impact
    }

    /// Returns the attached score breakdown, if scored.
    #[must_use]
    pub const fn score_breakdown(&self) -> Option<&ScoreBreakdown> {
        self.score_breakdown.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns a short description for logs and audit trails.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} -> {}", self.proposal_type, self.rationale.trim())
    }
}
