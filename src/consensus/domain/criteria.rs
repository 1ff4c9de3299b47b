//! Weighting of the four scoring criteria.

use super::{ConsensusDomainError, ProposalScore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.0001;

/// Names one of the four criteria weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoringWeight {
    /// Measured speed-up.
    Performance,
    /// Storage overhead.
    Storage,
    /// Implementation complexity.
    Complexity,
    /// Operational risk.
    Risk,
}

impl fmt::Display for ScoringWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Performance => "performance",
            Self::Storage => "storage",
            Self::Complexity => "complexity",
            Self::Risk => "risk",
        })
    }
}

/// Weights applied to proposal sub-scores.
///
/// Valid criteria have every weight in `[0, 1]` and a sum of 1.0 within
/// [`WEIGHT_SUM_TOLERANCE`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringCriteria {
    /// Weight of the performance sub-score.
    pub performance_weight: f64,
    /// Weight of the storage sub-score.
    pub storage_weight: f64,
    /// Weight of the complexity sub-score.
    pub complexity_weight: f64,
    /// Weight of the risk sub-score.
    pub risk_weight: f64,
}

impl Default for ScoringCriteria {
    fn default() -> Self {
        Self::new(0.5, 0.2, 0.2, 0.1)
    }
}

impl ScoringCriteria {
    /// Creates criteria from the four weights without validating them.
    #[must_use]
    pub const fn new(
        performance_weight: f64,
        storage_weight: f64,
        complexity_weight: f64,
        risk_weight: f64,
    ) -> Self {
        Self {
            performance_weight,
            storage_weight,
            complexity_weight,
            risk_weight,
        }
    }

    /// Checks the weight invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusDomainError::WeightsDoNotSumToOne`] when the sum
    /// deviates from 1.0 by more than the tolerance, or
    /// [`ConsensusDomainError::WeightOutOfRange`] for a weight outside
    /// `[0, 1]`.
    #[expect(clippy::float_arithmetic, reason = "summing weights")]
    pub fn validate(&self) -> Result<(), ConsensusDomainError> {
        let sum =
            self.performance_weight + self.storage_weight + self.complexity_weight + self.risk_weight;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE || sum.is_nan() {
            return Err(ConsensusDomainError::WeightsDoNotSumToOne { sum });
        }
        for (weight, value) in self.weights() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConsensusDomainError::WeightOutOfRange { weight, value });
            }
        }
        Ok(())
    }

    /// Combines the four sub-scores, rounded to two decimals.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "weighted sum of sub-scores")]
    pub fn calculate_weighted_total(&self, score: &ProposalScore) -> f64 {
        let weighted = score.performance * self.performance_weight
            + score.storage * self.storage_weight
            + score.complexity * self.complexity_weight
            + score.risk * self.risk_weight;
        round2(weighted)
    }

    const fn weights(&self) -> [(ScoringWeight, f64); 4] {
        [
            (ScoringWeight::Performance, self.performance_weight),
            (ScoringWeight::Storage, self.storage_weight),
            (ScoringWeight::Complexity, self.complexity_weight),
            (ScoringWeight::Risk, self.risk_weight),
        ]
    }
}

/// Rounds to two decimal places.
#[expect(clippy::float_arithmetic, reason = "decimal rounding")]
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
