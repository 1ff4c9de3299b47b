//! In-memory repository for consensus decisions.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::consensus::{
    domain::{ConsensusDecision, ConsensusDecisionId},
    ports::{ConsensusRepository, ConsensusRepositoryError, ConsensusRepositoryResult},
};
use crate::task::domain::TaskId;

/// Thread-safe in-memory consensus repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConsensusRepository {
    state: Arc<RwLock<InMemoryConsensusState>>,
}

#[derive(Debug, Default)]
struct InMemoryConsensusState {
    last_id: i64,
    decisions: BTreeMap<ConsensusDecisionId, ConsensusDecision>,
    task_index: BTreeMap<TaskId, ConsensusDecisionId>,
}

impl InMemoryConsensusRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> ConsensusRepositoryError {
    ConsensusRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ConsensusRepository for InMemoryConsensusRepository {
    async fn create(
        &self,
        decision: &ConsensusDecision,
    ) -> ConsensusRepositoryResult<ConsensusDecisionId> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.task_index.contains_key(&decision.task_id()) {
            return Err(ConsensusRepositoryError::DuplicateTask(decision.task_id()));
        }
        state.last_id += 1;
        let id = ConsensusDecisionId::new(state.last_id);
        let mut stored = decision.clone();
        stored.assign_id(id);
        state.task_index.insert(decision.task_id(), id);
        state.decisions.insert(id, stored);
        Ok(id)
    }

    async fn update(&self, decision: &ConsensusDecision) -> ConsensusRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let slot = state
            .decisions
            .get_mut(&decision.id())
            .ok_or(ConsensusRepositoryError::NotFound(decision.id()))?;
        *slot = decision.clone();
        Ok(())
    }

    async fn find_by_task(
        &self,
        task_id: TaskId,
    ) -> ConsensusRepositoryResult<Option<ConsensusDecision>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .task_index
            .get(&task_id)
            .and_then(|id| state.decisions.get(id))
            .cloned())
    }
}
