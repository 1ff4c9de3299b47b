//! Weighted multi-criteria scoring of competing proposals.

use crate::consensus::domain::{
    ConsensusDecision, ConsensusDomainError, DECISION_RATIONALE, ProposalScore, ScoringCriteria,
    round2,
};
use crate::proposal::domain::{BenchmarkResult, ImpactLevel, OptimizationProposal, ProposalId};
use crate::task::domain::AgentType;
use mockable::Clock;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

/// Score given to every proposal for complexity.
///
/// Complexity is not yet differentiated; every proposal receives the same
/// score so the criterion only shifts totals uniformly.
pub const BASELINE_COMPLEXITY_SCORE: f64 = 100.0;

/// Errors returned by [`ConsensusEngine::decide`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoringError {
    /// There was nothing to score.
    #[error("no proposals")]
    NoProposals,
    /// The weights violate the criteria invariants.
    #[error(transparent)]
    InvalidCriteria(#[from] ConsensusDomainError),
}

/// Pure scoring engine. The clock only stamps the decision.
#[derive(Debug, Clone)]
pub struct ConsensusEngine<C>
where
    C: Clock + Send + Sync,
{
    clock: Arc<C>,
}

impl<C> ConsensusEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an engine stamping decisions with `clock`.
    #[must_use]
    pub const fn new(clock: Arc<C>) -> Self {
        Self { clock }
    }

    /// Scores and ranks proposals, choosing the best as the winner.
    ///
    /// Each proposal is scored against the benchmarks referencing its
    /// identity. Proposals are sorted by weighted total, then performance,
    /// then storage, all descending; equal proposals keep their input order.
    /// Scores are keyed by the proposal's worker role, falling back to the
    /// proposal's position for unattributed proposals. When two proposals
    /// share a role the better-ranked one is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::NoProposals`] for an empty slice or
    /// [`ScoringError::InvalidCriteria`] when `criteria` is invalid.
    pub fn decide(
        &self,
        proposals: &[OptimizationProposal],
        benchmarks: &[BenchmarkResult],
        criteria: &ScoringCriteria,
    ) -> Result<ConsensusDecision, ScoringError> {
        if proposals.is_empty() {
            return Err(ScoringError::NoProposals);
        }
        criteria.validate()?;

        let mut by_proposal: HashMap<ProposalId, Vec<&BenchmarkResult>> = HashMap::new();
        for benchmark in benchmarks {
            by_proposal
                .entry(benchmark.proposal_id())
                .or_default()
                .push(benchmark);
        }

        let mut ranked: Vec<(AgentType, ProposalScore)> = proposals
            .iter()
            .enumerate()
            .map(|(position, proposal)| {
                let role = proposal
                    .agent_type()
                    .unwrap_or_else(|| AgentType::for_position(position));
                let evidence = by_proposal
                    .get(&proposal.id())
                    .map_or(&[][..], Vec::as_slice);
                (role, score_proposal(proposal, evidence, criteria))
            })
            .collect();

        ranked.sort_by(|(_, a), (_, b)| compare_scores(a, b));

        let mut all_scores = BTreeMap::new();
        for (position, (role, score)) in ranked.iter_mut().enumerate() {
            score.rank = position + 1;
            all_scores.entry(*role).or_insert(*score);
        }
        let winner = ranked.first().map(|(_, score)| score.proposal_id);

        Ok(ConsensusDecision::new(
            winner,
            all_scores,
            DECISION_RATIONALE,
            &*self.clock,
        ))
    }
}

fn compare_scores(a: &ProposalScore, b: &ProposalScore) -> Ordering {
    ordinal(b.weighted_total)
        .total_cmp(&ordinal(a.weighted_total))
        .then_with(|| ordinal(b.performance).total_cmp(&ordinal(a.performance)))
        .then_with(|| ordinal(b.storage).total_cmp(&ordinal(a.storage)))
}

/// Maps NaN below every number so it ranks last.
const fn ordinal(value: f64) -> f64 {
    if value.is_nan() {
        f64::NEG_INFINITY
    } else {
        value
    }
}

fn score_proposal(
    proposal: &OptimizationProposal,
    evidence: &[&BenchmarkResult],
    criteria: &ScoringCriteria,
) -> ProposalScore {
    let improvement = measured_improvement(evidence);
    let impact = proposal.estimated_impact();
    let mut score = ProposalScore {
        proposal_id: proposal.id(),
        performance: performance_score(improvement),
        storage: storage_score(impact.storage_overhead_mb),
        complexity: BASELINE_COMPLEXITY_SCORE,
        risk: risk_score(impact.risk),
        weighted_total: 0.0,
        rank: 0,
        improvement_pct: improvement.map_or(0.0, round2),
        storage_overhead_mb: impact.storage_overhead_mb,
    };
    score.weighted_total = criteria.calculate_weighted_total(&score);
    score
}

/// Improvement of the fastest optimised run over the baseline, in percent.
///
/// Returns `None` without a positive baseline and at least one positive
/// optimised run.
#[expect(clippy::float_arithmetic, reason = "relative speed-up")]
fn measured_improvement(evidence: &[&BenchmarkResult]) -> Option<f64> {
    let baseline = evidence
        .iter()
        .find(|result| result.query_name().is_baseline())
        .map(|result| result.execution_time_ms())?;
    let best = evidence
        .iter()
        .filter(|result| !result.query_name().is_baseline())
        .map(|result| result.execution_time_ms())
        .min_by(f64::total_cmp)?;
    if baseline <= 0.0 || best <= 0.0 {
        return None;
    }
    Some((baseline - best) / baseline * 100.0)
}

fn performance_score(improvement: Option<f64>) -> f64 {
    improvement.map_or(0.0, |pct| round2(pct.clamp(0.0, 100.0)))
}

#[expect(clippy::float_arithmetic, reason = "overhead penalty")]
fn storage_score(overhead_mb: f64) -> f64 {
    if overhead_mb.is_nan() {
        return 0.0;
    }
    if overhead_mb <= 0.0 {
        return 100.0;
    }
    round2((100.0 - overhead_mb).clamp(0.0, 100.0))
}

const fn risk_score(risk: ImpactLevel) -> f64 {
    match risk {
        ImpactLevel::Low => 100.0,
        ImpactLevel::Medium => 70.0,
        ImpactLevel::High => 40.0,
    }
}
