//! Orchestration services: worker routing, parallel fan-out and the task
//! processor.

mod orchestrator;
mod processor;
mod selector;

pub use orchestrator::{
    CleanupReport, OrchestratorError, ParallelOrchestrator, ParallelRun, WorkerAssignment,
    WorkerFailure,
};
pub use processor::{
    ProcessedTask, ProcessorRepositories, SubmitTaskRequest, TaskProcessor, TaskProcessorError,
    TaskProcessorResult,
};
pub use selector::{AgentSelector, LARGE_TABLE_ROWS, Selection};
