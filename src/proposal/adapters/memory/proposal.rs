//! In-memory repository for optimisation proposals.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::lock_error;
use crate::proposal::{
    domain::{OptimizationProposal, ProposalId},
    ports::{ProposalRepository, ProposalRepositoryError, ProposalRepositoryResult},
};
use crate::task::domain::AgentExecutionId;

/// Thread-safe in-memory proposal repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProposalRepository {
    state: Arc<RwLock<InMemoryProposalState>>,
}

#[derive(Debug, Default)]
struct InMemoryProposalState {
    last_id: i64,
    proposals: BTreeMap<ProposalId, OptimizationProposal>,
}

impl InMemoryProposalRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProposalRepository for InMemoryProposalRepository {
    async fn create(&self, proposal: &OptimizationProposal) -> ProposalRepositoryResult<ProposalId> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.last_id += 1;
        let id = ProposalId::new(state.last_id);
        let mut stored = proposal.clone();
        stored.assign_id(id);
        state.proposals.insert(id, stored);
        Ok(id)
    }

    async fn update(&self, proposal: &OptimizationProposal) -> ProposalRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let slot = state
            .proposals
            .get_mut(&proposal.id())
            .ok_or(ProposalRepositoryError::NotFound(proposal.id()))?;
        *slot = proposal.clone();
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: ProposalId,
    ) -> ProposalRepositoryResult<Option<OptimizationProposal>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.proposals.get(&id).cloned())
    }

    async fn find_by_execution(
        &self,
        execution_id: AgentExecutionId,
    ) -> ProposalRepositoryResult<Vec<OptimizationProposal>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .proposals
            .values()
            .filter(|proposal| proposal.agent_execution_id() == Some(execution_id))
            .cloned()
            .collect())
    }
}
