//! In-memory repository for agent execution records.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{AgentExecution, AgentExecutionId, TaskId},
    ports::{AgentExecutionRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory agent execution repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAgentExecutionRepository {
    state: Arc<RwLock<InMemoryExecutionState>>,
}

#[derive(Debug, Default)]
struct InMemoryExecutionState {
    last_id: i64,
    executions: BTreeMap<AgentExecutionId, AgentExecution>,
}

impl InMemoryAgentExecutionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl AgentExecutionRepository for InMemoryAgentExecutionRepository {
    async fn create(&self, execution: &AgentExecution) -> TaskRepositoryResult<AgentExecutionId> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.last_id += 1;
        let id = AgentExecutionId::new(state.last_id);
        let mut stored = execution.clone();
        stored.assign_id(id);
        state.executions.insert(id, stored);
        Ok(id)
    }

    async fn update(&self, execution: &AgentExecution) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let slot = state
            .executions
            .get_mut(&execution.id())
            .ok_or(TaskRepositoryError::ExecutionNotFound(execution.id()))?;
        *slot = execution.clone();
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: AgentExecutionId,
    ) -> TaskRepositoryResult<Option<AgentExecution>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.executions.get(&id).cloned())
    }

    async fn find_by_task(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<AgentExecution>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .executions
            .values()
            .filter(|execution| execution.task_id() == task_id)
            .cloned()
            .collect())
    }
}
