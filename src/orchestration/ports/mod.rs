//! Port contracts consumed by the orchestrator.
//!
//! Workers and the resource lifecycle are collaborators outside this crate;
//! only their contracts live here.

pub mod resource;
pub mod worker;

pub use resource::{
    QueryResult, ResourceLifecycle, ResourceLifecycleError, ResourceLifecycleResult,
};
#[cfg(test)]
pub use worker::MockWorker;
pub use worker::{
    AnalysisResult, Worker, WorkerError, WorkerFactory, WorkerResult, WorkerStep,
};
