//! Port contracts for task lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by the task processor.

pub mod repository;

pub use repository::{
    AgentExecutionRepository, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
};
