//! Domain model for task lifecycle management.
//!
//! The task domain models submitted optimisation tasks, their lifecycle
//! state machine, and the per-worker execution records created while a task
//! is processed. Infrastructure concerns stay outside the domain boundary.

mod agent_type;
mod error;
mod execution;
mod ids;
mod task;

pub use agent_type::AgentType;
pub use error::{
    ParseAgentTypeError, ParseExecutionStatusError, ParseTaskStatusError, ParseTaskTypeError,
    TaskDomainError,
};
pub use execution::{AgentExecution, ExecutionStatus, PersistedAgentExecutionData};
pub use ids::{AgentExecutionId, ResourceCopyId, TaskId};
pub use task::{
    MAX_DESCRIPTION_LENGTH, PersistedTaskData, Task, TaskMetadata, TaskStatus, TaskType,
};
