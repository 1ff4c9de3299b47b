//! In-memory repository for benchmark results.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use super::lock_error;
use crate::proposal::{
    domain::{BenchmarkId, BenchmarkResult, ProposalId},
    ports::{BenchmarkRepository, ProposalRepositoryResult},
};

/// Thread-safe in-memory benchmark repository.
///
/// Results are append-only and kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBenchmarkRepository {
    state: Arc<RwLock<Vec<BenchmarkResult>>>,
}

impl InMemoryBenchmarkRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BenchmarkRepository for InMemoryBenchmarkRepository {
    async fn create(&self, result: &BenchmarkResult) -> ProposalRepositoryResult<BenchmarkId> {
        let mut results = self.state.write().map_err(lock_error)?;
        let next = i64::try_from(results.len()).map_err(lock_error)? + 1;
        let id = BenchmarkId::new(next);
        let mut stored = result.clone();
        stored.assign_id(id);
        results.push(stored);
        Ok(id)
    }

    async fn find_by_proposal(
        &self,
        proposal_id: ProposalId,
    ) -> ProposalRepositoryResult<Vec<BenchmarkResult>> {
        let results = self.state.read().map_err(lock_error)?;
        Ok(results
            .iter()
            .filter(|result| result.proposal_id() == proposal_id)
            .cloned()
            .collect())
    }
}
