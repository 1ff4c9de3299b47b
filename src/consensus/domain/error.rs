//! Error types for consensus domain validation.

use super::ScoringWeight;
use thiserror::Error;

/// Errors returned while validating consensus domain values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConsensusDomainError {
    /// The four weights do not add up to one.
    #[error("invalid scoring criteria: weights must sum to 1.0, got {sum:.4}")]
    WeightsDoNotSumToOne {
        /// Actual sum of the weights.
        sum: f64,
    },

    /// A single weight lies outside `[0, 1]`.
    #[error("{weight} weight must be between 0.0 and 1.0, got {value}")]
    WeightOutOfRange {
        /// Which weight is out of range.
        weight: ScoringWeight,
        /// Offending value.
        value: f64,
    },

    /// A decision can only be bound to a persisted task.
    #[error("consensus decision requires a persisted task")]
    UnassignedTaskId,

    /// Only a decision with a winner can be applied.
    #[error("consensus decision has no winning proposal to apply")]
    NoWinningProposal,
}
