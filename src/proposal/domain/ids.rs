//! Identifier types for proposals and benchmarks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an optimisation proposal.
///
/// Positive values are durable identities assigned by a repository. Negative
/// values are provisional identities stamped on in-flight proposals so their
/// benchmarks can be linked before the proposal is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(i64);

impl ProposalId {
    /// Identity carried by proposals that have not been stamped or stored.
    pub const UNASSIGNED: Self = Self(0);

    /// Wraps a durable identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Builds the provisional identity for the proposal at a dispatch slot.
    #[must_use]
    pub fn provisional(slot: usize) -> Self {
        let position = i64::try_from(slot).unwrap_or(i64::MAX - 1);
        Self(-(position + 1))
    }

    /// Returns whether this identity is provisional.
    #[must_use]
    pub const fn is_provisional(self) -> bool {
        self.0 < 0
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a stored benchmark result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BenchmarkId(i64);

impl BenchmarkId {
    /// Identity carried by results that have not been stored.
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

impl fmt::Display for BenchmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
