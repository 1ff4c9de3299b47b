//! Consensus decision and per-proposal scores.

use super::{ConsensusDomainError, ScoringCriteria};
use crate::proposal::domain::{ProposalId, ScoreBreakdown};
use crate::task::domain::{AgentType, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Rationale recorded on every engine-produced decision.
pub const DECISION_RATIONALE: &str = "selected highest weighted total per criteria";

/// Identifier of a stored consensus decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsensusDecisionId(i64);

impl ConsensusDecisionId {
    /// Identity carried by decisions that have not been stored.
    pub const UNASSIGNED: Self = Self(0);

    /// Wraps a durable identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ConsensusDecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scores computed for one proposal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProposalScore {
    /// Scored proposal.
    pub proposal_id: ProposalId,
    /// Performance sub-score (0-100).
    pub performance: f64,
    /// Storage sub-score (0-100).
    pub storage: f64,
    /// Complexity sub-score (0-100).
    pub complexity: f64,
    /// Risk sub-score (0-100).
    pub risk: f64,
    /// Weighted total, rounded to two decimals.
    pub weighted_total: f64,
    /// Position in the ranking, 1 being the best.
    pub rank: usize,
    /// Measured improvement over the baseline, in percent.
    pub improvement_pct: f64,
    /// Estimated storage overhead, in MB.
    pub storage_overhead_mb: f64,
}

impl ProposalScore {
    /// Returns the sub-scores in the shape stored on a proposal.
    #[must_use]
    pub const fn breakdown(&self) -> ScoreBreakdown {
        ScoreBreakdown {
            performance: self.performance,
            storage: self.storage,
            complexity: self.complexity,
            risk: self.risk,
            weighted_total: self.weighted_total,
        }
    }
}

/// Outcome of consensus for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusDecision {
    id: ConsensusDecisionId,
    task_id: TaskId,
    winning_proposal_id: Option<ProposalId>,
    all_scores: BTreeMap<AgentType, ProposalScore>,
    decision_rationale: String,
    applied_to_main: bool,
    created_at: DateTime<Utc>,
}

impl ConsensusDecision {
    /// Creates an unbound, unapplied decision.
    #[must_use]
    pub fn new(
        winning_proposal_id: Option<ProposalId>,
        all_scores: BTreeMap<AgentType, ProposalScore>,
        decision_rationale: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: ConsensusDecisionId::UNASSIGNED,
            task_id: TaskId::UNASSIGNED,
            winning_proposal_id,
            all_scores,
            decision_rationale: decision_rationale.into(),
            applied_to_main: false,
            created_at: clock.utc(),
        }
    }

    /// Binds the decision to the task it was computed for.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusDomainError::UnassignedTaskId`] for an unsaved task.
    pub const fn bind_to_task(&mut self, task_id: TaskId) -> Result<(), ConsensusDomainError> {
        if !task_id.is_assigned() {
            return Err(ConsensusDomainError::UnassignedTaskId);
        }
        self.task_id = task_id;
        Ok(())
    }

    /// Records the durable identity assigned by a repository.
    pub const fn assign_id(&mut self, id: ConsensusDecisionId) {
        self.id = id;
    }

    /// Flags the winner as applied to the shared resource.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusDomainError::NoWinningProposal`] when the decision
    /// has no winner.
    pub const fn mark_applied(&mut self) -> Result<(), ConsensusDomainError> {
        if self.winning_proposal_id.is_none() {
            return Err(ConsensusDomainError::NoWinningProposal);
        }
        self.applied_to_main = true;
        Ok(())
    }

    /// Recomputes every weighted total under `criteria`.
    ///
    /// Ranks are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusDomainError`] when `criteria` is invalid; scores are
    /// untouched in that case.
    pub fn apply_scores(&mut self, criteria: &ScoringCriteria) -> Result<(), ConsensusDomainError> {
        criteria.validate()?;
        for score in self.all_scores.values_mut() {
            score.weighted_total = criteria.calculate_weighted_total(score);
        }
        Ok(())
    }

    /// Returns the score recorded for a given proposal.
    #[must_use]
    pub fn score_for_proposal(&self, proposal_id: ProposalId) -> Option<&ProposalScore> {
        self.all_scores
            .values()
            .find(|score| score.proposal_id == proposal_id)
    }

    /// Returns the decision identifier.
    #[must_use]
    pub const fn id(&self) -> ConsensusDecisionId {
        self.id
    }

    /// Returns the task the decision belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the winning proposal, if any.
    #[must_use]
    pub const fn winning_proposal_id(&self) -> Option<ProposalId> {
        self.winning_proposal_id
    }

    /// Returns scores keyed by worker role.
    #[must_use]
    pub const fn all_scores(&self) -> &BTreeMap<AgentType, ProposalScore> {
        &self.all_scores
    }

    /// Returns the decision rationale.
    #[must_use]
    pub fn decision_rationale(&self) -> &str {
        &self.decision_rationale
    }

    /// Returns whether the winner has been applied.
    #[must_use]
    pub const fn applied_to_main(&self) -> bool {
        self.applied_to_main
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
