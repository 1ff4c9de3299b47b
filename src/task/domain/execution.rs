//! Record of one worker's run against one task.

use super::{
    AgentExecutionId, AgentType, ParseExecutionStatusError, ResourceCopyId, TaskDomainError,
    TaskId,
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an agent execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Worker has been dispatched.
    Running,
    /// Worker delivered a proposal and its benchmarks.
    Completed,
    /// Worker failed or timed out.
    Failed,
}

impl ExecutionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ExecutionStatus {
    type Error = ParseExecutionStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseExecutionStatusError(value.to_owned())),
        }
    }
}

/// One worker's run against one task.
///
/// The completion time is set exactly when the status is `completed`, and the
/// error text exactly when the status is `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentExecution {
    id: AgentExecutionId,
    task_id: TaskId,
    agent_type: AgentType,
    resource_copy_id: ResourceCopyId,
    status: ExecutionStatus,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

/// Parameter object for reconstructing a persisted execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAgentExecutionData {
    /// Persisted execution identifier.
    pub id: AgentExecutionId,
    /// Owning task.
    pub task_id: TaskId,
    /// Worker role.
    pub agent_type: AgentType,
    /// Isolated copy assigned to the worker.
    pub resource_copy_id: ResourceCopyId,
    /// Persisted status.
    pub status: ExecutionStatus,
    /// Dispatch timestamp.
    pub started_at: DateTime<Utc>,
    /// Completion timestamp, if completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Error text, if failed.
    pub error: Option<String>,
}

impl AgentExecution {
    /// Creates a running execution for a dispatched worker.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnassignedTaskId`] when the task has not
    /// been persisted or [`TaskDomainError::EmptyResourceCopyId`] when the
    /// copy identifier is blank.
    pub fn start(
        task_id: TaskId,
        agent_type: AgentType,
        resource_copy_id: ResourceCopyId,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        if !task_id.is_assigned() {
            return Err(TaskDomainError::UnassignedTaskId);
        }
        if resource_copy_id.is_blank() {
            return Err(TaskDomainError::EmptyResourceCopyId);
        }
        Ok(Self {
            id: AgentExecutionId::UNASSIGNED,
            task_id,
            agent_type,
            resource_copy_id,
            status: ExecutionStatus::Running,
            started_at: clock.utc(),
            completed_at: None,
            error: None,
        })
    }

    /// Reconstructs an execution from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAgentExecutionData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            agent_type: data.agent_type,
            resource_copy_id: data.resource_copy_id,
            status: data.status,
            started_at: data.started_at,
            completed_at: data.completed_at,
            error: data.error,
        }
    }

    /// Records the durable identity assigned by a repository.
    pub const fn assign_id(&mut self, id: AgentExecutionId) {
        self.id = id;
    }

    /// Returns the execution identifier.
    #[must_use]
    pub const fn id(&self) -> AgentExecutionId {
        self.id
    }

    /// Returns the owning task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the worker role.
    #[must_use]
    pub const fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    /// Returns the isolated copy assigned to the worker.
    #[must_use]
    pub const fn resource_copy_id(&self) -> &ResourceCopyId {
        &self.resource_copy_id
    }

    /// Returns the execution status.
    #[must_use]
    pub const fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// Returns the dispatch timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the completion timestamp, if completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the failure message, if failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns whether the execution finished, successfully or not.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ExecutionStatus::Completed | ExecutionStatus::Failed
        )
    }

    /// Returns elapsed time between dispatch and completion.
    #[must_use]
    pub fn duration(&self) -> Option<TimeDelta> {
        self.completed_at
            .map(|completed_at| completed_at - self.started_at)
    }

    /// Marks the execution as completed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidExecutionTransition`] unless the
    /// execution is running.
    pub fn mark_completed(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.ensure_running(ExecutionStatus::Completed)?;
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(clock.utc());
        Ok(())
    }

    /// Marks the execution as failed with a diagnostic message.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyExecutionError`] when the message is
    /// blank or [`TaskDomainError::InvalidExecutionTransition`] unless the
    /// execution is running.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), TaskDomainError> {
        let message = error.into().trim().to_owned();
        if message.is_empty() {
            return Err(TaskDomainError::EmptyExecutionError);
        }
        self.ensure_running(ExecutionStatus::Failed)?;
        self.status = ExecutionStatus::Failed;
        self.error = Some(message);
        Ok(())
    }

    const fn ensure_running(&self, target: ExecutionStatus) -> Result<(), TaskDomainError> {
        if matches!(self.status, ExecutionStatus::Running) {
            return Ok(());
        }
        Err(TaskDomainError::InvalidExecutionTransition {
            execution_id: self.id,
            from: self.status,
            to: target,
        })
    }
}
