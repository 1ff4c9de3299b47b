//! In-memory adapters for task and agent execution persistence.

mod execution;
mod task;

pub use execution::InMemoryAgentExecutionRepository;
pub use task::InMemoryTaskRepository;
