//! Domain model for consensus scoring.

mod criteria;
mod decision;
mod error;

pub(crate) use criteria::round2;
pub use criteria::{ScoringCriteria, ScoringWeight, WEIGHT_SUM_TOLERANCE};
pub use decision::{ConsensusDecision, ConsensusDecisionId, DECISION_RATIONALE, ProposalScore};
pub use error::ConsensusDomainError;
