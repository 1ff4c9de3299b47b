//! Unit tests for the consensus scoring engine.

#![expect(clippy::float_arithmetic, reason = "tolerance checks on computed scores")]

use crate::consensus::domain::{DECISION_RATIONALE, ScoringCriteria};
use crate::consensus::services::{ConsensusEngine, ScoringError};
use crate::proposal::domain::{
    BenchmarkMeasurement, BenchmarkQueryName, BenchmarkResult, EstimatedImpact, ExplainPlan,
    ImpactLevel, OptimizationProposal, PersistedProposalData, ProposalId, ProposalType,
};
use crate::task::domain::{AgentExecutionId, AgentType};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use std::sync::Arc;

#[fixture]
fn engine() -> ConsensusEngine<DefaultClock> {
    ConsensusEngine::new(Arc::new(DefaultClock))
}

fn proposal(id: i64, overhead_mb: f64, risk: ImpactLevel) -> OptimizationProposal {
    let mut proposal = OptimizationProposal::new(
        ProposalType::Index,
        vec![format!("CREATE INDEX idx_{id} ON orders (status)")],
        "index the filter column",
        EstimatedImpact::new(50.0, overhead_mb, ImpactLevel::Low, risk),
        &DefaultClock,
    )
    .expect("valid proposal");
    proposal.assign_id(ProposalId::new(id));
    proposal
}

fn run(proposal_id: i64, name: BenchmarkQueryName, elapsed_ms: f64) -> BenchmarkResult {
    BenchmarkResult::new(
        BenchmarkMeasurement {
            proposal_id: ProposalId::new(proposal_id),
            query_name: name,
            query_executed: "SELECT * FROM orders".to_owned(),
            execution_time_ms: elapsed_ms,
            rows_returned: 1,
            explain_plan: ExplainPlan::of_type("Index Scan"),
            storage_impact_mb: 0.0,
        },
        &DefaultClock,
    )
    .expect("valid benchmark")
}

fn suite(proposal_id: i64, best_ms: f64) -> Vec<BenchmarkResult> {
    vec![
        run(proposal_id, BenchmarkQueryName::Baseline, 100.0),
        run(proposal_id, BenchmarkQueryName::TestLimit, best_ms + 5.0),
        run(proposal_id, BenchmarkQueryName::TestFilter, best_ms),
    ]
}

#[rstest]
fn empty_proposals_are_rejected(engine: ConsensusEngine<DefaultClock>) {
    let result = engine.decide(&[], &[], &ScoringCriteria::default());
    assert_eq!(result, Err(ScoringError::NoProposals));
}

#[rstest]
fn invalid_criteria_are_rejected(engine: ConsensusEngine<DefaultClock>) {
    let result = engine.decide(
        &[proposal(1, 0.0, ImpactLevel::Low)],
        &[],
        &ScoringCriteria::new(0.6, 0.6, 0.0, 0.0),
    );
    assert!(matches!(result, Err(ScoringError::InvalidCriteria(_))));
}

#[rstest]
fn reference_scenario_ranks_three_proposals(engine: ConsensusEngine<DefaultClock>) {
    let proposals = vec![
        proposal(1, 10.0, ImpactLevel::Low),
        proposal(2, 40.0, ImpactLevel::Medium),
        proposal(3, 50.0, ImpactLevel::Medium),
    ];
    let benchmarks: Vec<BenchmarkResult> = [(1, 10.0), (2, 21.0), (3, 41.0)]
        .into_iter()
        .flat_map(|(id, best)| suite(id, best))
        .collect();

    let decision = engine
        .decide(&proposals, &benchmarks, &ScoringCriteria::default())
        .expect("decision");

    assert_eq!(decision.winning_proposal_id(), Some(ProposalId::new(1)));
    assert_eq!(decision.decision_rationale(), DECISION_RATIONALE);
    assert!(!decision.applied_to_main());

    let expected = [(1, 93.0, 1), (2, 78.5, 2), (3, 66.5, 3)];
    for (id, total, rank) in expected {
        let score = decision
            .score_for_proposal(ProposalId::new(id))
            .expect("scored proposal");
        assert!(
            (score.weighted_total - total).abs() < 0.01,
            "proposal {id} scored {}",
            score.weighted_total
        );
        assert_eq!(score.rank, rank);
    }
}

#[rstest]
fn untagged_proposals_fall_back_to_position(engine: ConsensusEngine<DefaultClock>) {
    let proposals = vec![
        proposal(1, 0.0, ImpactLevel::Low),
        proposal(2, 0.0, ImpactLevel::Low),
        proposal(3, 0.0, ImpactLevel::Low),
    ];
    let decision = engine
        .decide(&proposals, &[], &ScoringCriteria::default())
        .expect("decision");

    let keyed: Vec<(AgentType, i64)> = decision
        .all_scores()
        .iter()
        .map(|(role, score)| (*role, score.proposal_id.value()))
        .collect();
    assert_eq!(
        keyed,
        vec![
            (AgentType::Cerebro, 1),
            (AgentType::Operativo, 2),
            (AgentType::Bulk, 3)
        ]
    );
}

#[rstest]
fn tagged_proposals_are_keyed_by_role_regardless_of_order(
    engine: ConsensusEngine<DefaultClock>,
) {
    let mut bulk = proposal(1, 0.0, ImpactLevel::Low);
    bulk.attribute_to(AgentType::Bulk, AgentExecutionId::new(10));
    let mut cerebro = proposal(2, 0.0, ImpactLevel::Low);
    cerebro.attribute_to(AgentType::Cerebro, AgentExecutionId::new(11));

    let decision = engine
        .decide(&[bulk, cerebro], &[], &ScoringCriteria::default())
        .expect("decision");

    let scores = decision.all_scores();
    assert_eq!(scores.len(), 2);
    assert_eq!(
        scores.get(&AgentType::Bulk).map(|s| s.proposal_id),
        Some(ProposalId::new(1))
    );
    assert_eq!(
        scores.get(&AgentType::Cerebro).map(|s| s.proposal_id),
        Some(ProposalId::new(2))
    );
}

#[rstest]
fn duplicate_role_keeps_the_better_ranked_score(engine: ConsensusEngine<DefaultClock>) {
    let mut weaker = proposal(1, 0.0, ImpactLevel::High);
    weaker.attribute_to(AgentType::Operativo, AgentExecutionId::new(1));
    let mut stronger = proposal(2, 0.0, ImpactLevel::Low);
    stronger.attribute_to(AgentType::Operativo, AgentExecutionId::new(2));

    let decision = engine
        .decide(&[weaker, stronger], &[], &ScoringCriteria::default())
        .expect("decision");

    let kept = decision
        .all_scores()
        .get(&AgentType::Operativo)
        .expect("operativo score");
    assert_eq!(kept.proposal_id, ProposalId::new(2));
    assert_eq!(kept.rank, 1);
}

#[rstest]
fn zero_overhead_scores_full_storage(engine: ConsensusEngine<DefaultClock>) {
    let decision = engine
        .decide(
            &[proposal(1, 0.0, ImpactLevel::Low)],
            &[],
            &ScoringCriteria::default(),
        )
        .expect("decision");
    let score = decision
        .score_for_proposal(ProposalId::new(1))
        .expect("score");
    assert!((score.storage - 100.0).abs() < f64::EPSILON);
}

#[rstest]
fn missing_baseline_scores_zero_performance(engine: ConsensusEngine<DefaultClock>) {
    let benchmarks = vec![run(1, BenchmarkQueryName::TestSort, 5.0)];
    let decision = engine
        .decide(
            &[proposal(1, 0.0, ImpactLevel::Low)],
            &benchmarks,
            &ScoringCriteria::default(),
        )
        .expect("decision");
    let score = decision
        .score_for_proposal(ProposalId::new(1))
        .expect("score");
    assert!(score.performance.abs() < f64::EPSILON);
}

#[rstest]
fn slower_variant_clamps_performance_to_zero(engine: ConsensusEngine<DefaultClock>) {
    let benchmarks = vec![
        run(1, BenchmarkQueryName::Baseline, 10.0),
        run(1, BenchmarkQueryName::TestLimit, 20.0),
    ];
    let decision = engine
        .decide(
            &[proposal(1, 0.0, ImpactLevel::Low)],
            &benchmarks,
            &ScoringCriteria::default(),
        )
        .expect("decision");
    let score = decision
        .score_for_proposal(ProposalId::new(1))
        .expect("score");
    assert!(score.performance.abs() < f64::EPSILON);
    assert!((score.improvement_pct + 100.0).abs() < 1e-9);
}

fn stored_proposal(id: i64, overhead_mb: f64, risk: ImpactLevel) -> OptimizationProposal {
    OptimizationProposal::from_persisted(PersistedProposalData {
        id: ProposalId::new(id),
        agent_execution_id: None,
        agent_type: None,
        proposal_type: ProposalType::Index,
        statements: vec![format!("CREATE INDEX idx_{id} ON orders (status)")],
        rationale: "index the filter column".to_owned(),
        estimated_impact: EstimatedImpact::new(10.0, overhead_mb, ImpactLevel::Low, risk),
        score_breakdown: None,
        created_at: chrono::Utc::now(),
    })
}

#[rstest]
fn unknown_storage_overhead_scores_zero_and_cannot_win(engine: ConsensusEngine<DefaultClock>) {
    let proposals = vec![
        proposal(1, 10.0, ImpactLevel::Low),
        stored_proposal(2, f64::NAN, ImpactLevel::High),
    ];
    let mut benchmarks = suite(1, 10.0);
    benchmarks.extend(suite(2, 90.0));

    let decision = engine
        .decide(&proposals, &benchmarks, &ScoringCriteria::default())
        .expect("decision");

    assert_eq!(decision.winning_proposal_id(), Some(ProposalId::new(1)));
    let malformed = decision
        .score_for_proposal(ProposalId::new(2))
        .expect("scored proposal");
    assert_eq!(malformed.storage, 0.0);
    assert!(malformed.weighted_total.is_finite());
    assert_eq!(malformed.rank, 2);
}

#[rstest]
fn ties_break_on_performance_then_input_order(engine: ConsensusEngine<DefaultClock>) {
    // Same total: proposal 2 trades storage for performance.
    let criteria = ScoringCriteria::new(0.5, 0.5, 0.0, 0.0);
    let proposals = vec![
        proposal(1, 20.0, ImpactLevel::Low),
        proposal(2, 40.0, ImpactLevel::Low),
        proposal(3, 20.0, ImpactLevel::Low),
    ];
    let mut benchmarks = suite(1, 60.0);
    benchmarks.extend(suite(2, 40.0));
    benchmarks.extend(suite(3, 60.0));

    let decision = engine
        .decide(&proposals, &benchmarks, &criteria)
        .expect("decision");

    let rank_of = |id| {
        decision
            .score_for_proposal(ProposalId::new(id))
            .map(|score| score.rank)
    };
    assert_eq!(decision.winning_proposal_id(), Some(ProposalId::new(2)));
    assert_eq!(rank_of(1), Some(2));
    assert_eq!(rank_of(3), Some(3));
}
