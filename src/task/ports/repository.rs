//! Repository ports for task and agent execution persistence.

use crate::task::domain::{AgentExecution, AgentExecutionId, Task, TaskId, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task and returns its durable identity.
    async fn create(&self, task: &Task) -> TaskRepositoryResult<TaskId>;

    /// Persists changes to an existing task (status, completion time).
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Lists tasks ordered by identity, optionally filtered by status.
    async fn list(&self, status: Option<TaskStatus>) -> TaskRepositoryResult<Vec<Task>>;
}

/// Agent execution persistence contract.
#[async_trait]
pub trait AgentExecutionRepository: Send + Sync {
    /// Stores a new execution and returns its durable identity.
    async fn create(&self, execution: &AgentExecution) -> TaskRepositoryResult<AgentExecutionId>;

    /// Persists a status change on an existing execution.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::ExecutionNotFound`] when the execution
    /// does not exist.
    async fn update(&self, execution: &AgentExecution) -> TaskRepositoryResult<()>;

    /// Finds an execution by identifier.
    async fn find_by_id(
        &self,
        id: AgentExecutionId,
    ) -> TaskRepositoryResult<Option<AgentExecution>>;

    /// Returns every execution recorded for a task, in creation order.
    async fn find_by_task(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<AgentExecution>>;
}

/// Errors returned by task and execution repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The agent execution was not found.
    #[error("agent execution not found: {0}")]
    ExecutionNotFound(AgentExecutionId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
