//! Repository ports for proposals and benchmark results.

use crate::proposal::domain::{BenchmarkId, BenchmarkResult, OptimizationProposal, ProposalId};
use crate::task::domain::AgentExecutionId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for proposal repository operations.
pub type ProposalRepositoryResult<T> = Result<T, ProposalRepositoryError>;

/// Proposal persistence contract.
#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Stores a new proposal and returns its durable identity.
    ///
    /// Any provisional identity carried by `proposal` is replaced.
    async fn create(&self, proposal: &OptimizationProposal) -> ProposalRepositoryResult<ProposalId>;

    /// Persists changes to an existing proposal, such as its score breakdown.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalRepositoryError::NotFound`] when the proposal does
    /// not exist.
    async fn update(&self, proposal: &OptimizationProposal) -> ProposalRepositoryResult<()>;

    /// Finds a proposal by identifier.
    async fn find_by_id(
        &self,
        id: ProposalId,
    ) -> ProposalRepositoryResult<Option<OptimizationProposal>>;

    /// Returns the proposals recorded for an execution, in creation order.
    async fn find_by_execution(
        &self,
        execution_id: AgentExecutionId,
    ) -> ProposalRepositoryResult<Vec<OptimizationProposal>>;
}

/// Benchmark result persistence contract.
#[async_trait]
pub trait BenchmarkRepository: Send + Sync {
    /// Stores a benchmark result and returns its durable identity.
    async fn create(&self, result: &BenchmarkResult) -> ProposalRepositoryResult<BenchmarkId>;

    /// Returns the results recorded for a proposal, in creation order.
    async fn find_by_proposal(
        &self,
        proposal_id: ProposalId,
    ) -> ProposalRepositoryResult<Vec<BenchmarkResult>>;
}

/// Errors returned by proposal and benchmark repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ProposalRepositoryError {
    /// The proposal was not found.
    #[error("proposal not found: {0}")]
    NotFound(ProposalId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProposalRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
