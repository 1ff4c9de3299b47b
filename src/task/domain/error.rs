//! Error types for task domain validation and parsing.

use super::{AgentExecutionId, ExecutionStatus, TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating task domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The target query is empty after trimming.
    #[error("target query must not be empty")]
    EmptyTargetQuery,

    /// The description exceeds the storage limit.
    #[error("task description has {length} characters, limit is {max}")]
    DescriptionTooLong {
        /// Actual description length in characters.
        length: usize,
        /// Maximum accepted length in characters.
        max: usize,
    },

    /// The operation requires a task that has been persisted.
    #[error("task has no durable identity yet")]
    UnassignedTaskId,

    /// Transitioning between two task states is not allowed.
    #[error("invalid task state transition for {task_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Task identifier.
        task_id: TaskId,
        /// Current state.
        from: TaskStatus,
        /// Requested target state.
        to: TaskStatus,
    },

    /// The isolated resource copy identifier is empty.
    #[error("resource copy identifier must not be empty")]
    EmptyResourceCopyId,

    /// A failed execution must carry a diagnostic message.
    #[error("failed agent execution requires an error message")]
    EmptyExecutionError,

    /// Transitioning an agent execution is not allowed.
    #[error("invalid agent execution transition for {execution_id}: {from} -> {to}")]
    InvalidExecutionTransition {
        /// Execution identifier.
        execution_id: AgentExecutionId,
        /// Current status.
        from: ExecutionStatus,
        /// Requested target status.
        to: ExecutionStatus,
    },
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task types from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task type: {0}")]
pub struct ParseTaskTypeError(pub String);

/// Error returned while parsing agent types from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown agent type: {0}")]
pub struct ParseAgentTypeError(pub String);

/// Error returned while parsing execution statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown agent execution status: {0}")]
pub struct ParseExecutionStatusError(pub String);
