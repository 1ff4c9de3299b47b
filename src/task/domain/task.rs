//! Task aggregate root and related task lifecycle types.

use super::{ParseTaskStatusError, ParseTaskTypeError, TaskDomainError, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Maximum task description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Free-form task metadata supplied by the caller.
pub type TaskMetadata = BTreeMap<String, Value>;

/// Category of optimisation work requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Rewrite or index a single slow query.
    QueryOptimization,
    /// Improve table structure.
    SchemaImprovement,
    /// Add, drop or reshape indexes.
    IndexTuning,
    /// Partition large tables.
    Partitioning,
}

impl TaskType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QueryOptimization => "query_optimization",
            Self::SchemaImprovement => "schema_improvement",
            Self::IndexTuning => "index_tuning",
            Self::Partitioning => "partitioning",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskType {
    type Error = ParseTaskTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "query_optimization" => Ok(Self::QueryOptimization),
            "schema_improvement" => Ok(Self::SchemaImprovement),
            "index_tuning" => Ok(Self::IndexTuning),
            "partitioning" => Ok(Self::Partitioning),
            _ => Err(ParseTaskTypeError(value.to_owned())),
        }
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been submitted but processing has not started.
    Pending,
    /// Workers are being routed, executed or scored.
    InProgress,
    /// A consensus decision was reached.
    Completed,
    /// Processing stopped on an error.
    Failed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns whether no transition is defined out of this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns whether transition to `target` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::InProgress | Self::Failed)
                | (Self::InProgress, Self::Completed | Self::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    task_type: TaskType,
    description: String,
    target_query: String,
    status: TaskStatus,
    metadata: TaskMetadata,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted task type.
    pub task_type: TaskType,
    /// Persisted description.
    pub description: String,
    /// Persisted target query.
    pub target_query: String,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted metadata.
    pub metadata: TaskMetadata,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted completion timestamp, if any.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a pending task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTargetQuery`] when the target query is
    /// blank or [`TaskDomainError::DescriptionTooLong`] when the description
    /// exceeds [`MAX_DESCRIPTION_LENGTH`] characters.
    pub fn new(
        task_type: TaskType,
        description: impl Into<String>,
        target_query: impl Into<String>,
        metadata: TaskMetadata,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let description_text = description.into();
        let query = target_query.into();

        if query.trim().is_empty() {
            return Err(TaskDomainError::EmptyTargetQuery);
        }
        let length = description_text.chars().count();
        if length > MAX_DESCRIPTION_LENGTH {
            return Err(TaskDomainError::DescriptionTooLong {
                length,
                max: MAX_DESCRIPTION_LENGTH,
            });
        }

        Ok(Self {
            id: TaskId::UNASSIGNED,
            task_type,
            description: description_text,
            target_query: query,
            status: TaskStatus::Pending,
            metadata,
            created_at: clock.utc(),
            completed_at: None,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            task_type: data.task_type,
            description: data.description,
            target_query: data.target_query,
            status: data.status,
            metadata: data.metadata,
            created_at: data.created_at,
            completed_at: data.completed_at,
        }
    }

    /// Records the durable identity assigned by a repository.
    pub const fn assign_id(&mut self, id: TaskId) {
        self.id = id;
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task type.
    #[must_use]
    pub const fn task_type(&self) -> TaskType {
        self.task_type
    }

    /// Returns the free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the query or subject under optimisation.
    #[must_use]
    pub fn target_query(&self) -> &str {
        &self.target_query
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the caller-supplied metadata.
    #[must_use]
    pub const fn metadata(&self) -> &TaskMetadata {
        &self.metadata
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the completion timestamp, if the task completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Moves the task to `target`, consulting the transition table first.
    ///
    /// Reaching [`TaskStatus::Completed`] stamps the completion time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the
    /// transition is not allowed.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        if target == TaskStatus::Completed {
            self.completed_at = Some(clock.utc());
        }
        Ok(())
    }

    /// Returns whether the task completed successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}
