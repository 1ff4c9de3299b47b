//! Domain model for optimisation proposals and benchmark evidence.
//!
//! A proposal is one worker's suggested change. Benchmarks are the measured
//! runs that back it up and feed the consensus scoring.

mod benchmark;
mod error;
mod ids;
mod proposal;

pub use benchmark::{
    BenchmarkMeasurement, BenchmarkQueryName, BenchmarkResult, BufferUsage, ExplainPlan,
};
pub use error::{
    ParseBenchmarkQueryNameError, ParseImpactLevelError, ParseProposalTypeError,
    ProposalDomainError,
};
pub use ids::{BenchmarkId, ProposalId};
pub use proposal::{
    EstimatedImpact, ImpactLevel, OptimizationProposal, PersistedProposalData, ProposalType,
    ScoreBreakdown,
};
