//! Consensus: turning competing proposals into one decision.
//!
//! The [`services::ConsensusEngine`] scores every proposal on performance,
//! storage, complexity and risk, combines the sub-scores with configurable
//! [`domain::ScoringCriteria`], and ranks them deterministically. The result
//! is a [`domain::ConsensusDecision`] naming the winner.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
