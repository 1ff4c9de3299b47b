//! Repository port for consensus decisions.

use crate::consensus::domain::{ConsensusDecision, ConsensusDecisionId};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for consensus repository operations.
pub type ConsensusRepositoryResult<T> = Result<T, ConsensusRepositoryError>;

/// Consensus decision persistence contract.
///
/// A task has at most one decision.
#[async_trait]
pub trait ConsensusRepository: Send + Sync {
    /// Stores a decision and returns its durable identity.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusRepositoryError::DuplicateTask`] when the task
    /// already has a decision.
    async fn create(
        &self,
        decision: &ConsensusDecision,
    ) -> ConsensusRepositoryResult<ConsensusDecisionId>;

    /// Persists changes to an existing decision, such as the applied flag.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusRepositoryError::NotFound`] when the decision does
    /// not exist.
    async fn update(&self, decision: &ConsensusDecision) -> ConsensusRepositoryResult<()>;

    /// Finds the decision recorded for a task.
    async fn find_by_task(
        &self,
        task_id: TaskId,
    ) -> ConsensusRepositoryResult<Option<ConsensusDecision>>;
}

/// Errors returned by consensus repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ConsensusRepositoryError {
    /// The decision was not found.
    #[error("consensus decision not found: {0}")]
    NotFound(ConsensusDecisionId),

    /// The task already has a decision.
    #[error("task {0} already has a consensus decision")]
    DuplicateTask(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ConsensusRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
