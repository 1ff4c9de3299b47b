//! Consensus services.

mod engine;

pub use engine::{BASELINE_COMPLEXITY_SCORE, ConsensusEngine, ScoringError};
