//! Resource lifecycle port for isolated copies of the shared resource.

use crate::task::domain::ResourceCopyId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for resource lifecycle operations.
pub type ResourceLifecycleResult<T> = Result<T, ResourceLifecycleError>;

/// Outcome of a single statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Rows affected or returned by the statement.
    pub rows_affected: u64,
}

/// Provisioning and statement execution against the shared resource and its
/// disposable copies.
#[async_trait]
pub trait ResourceLifecycle: Send + Sync {
    /// Creates an isolated copy of `parent` named `name`.
    async fn create_copy(&self, parent: &str, name: &str) -> ResourceLifecycleResult<ResourceCopyId>;

    /// Executes one statement against `target` within `timeout_ms`.
    async fn execute_statement(
        &self,
        target: &str,
        statement: &str,
        timeout_ms: u64,
    ) -> ResourceLifecycleResult<QueryResult>;

    /// Destroys a copy.
    ///
    /// Destroying a copy that no longer exists succeeds.
    async fn destroy_copy(&self, copy_id: &ResourceCopyId) -> ResourceLifecycleResult<()>;
}

/// Errors returned by resource lifecycle adapters.
#[derive(Debug, Clone, Error)]
pub enum ResourceLifecycleError {
    /// A copy could not be provisioned.
    #[error("failed to create copy '{name}' of '{parent}': {reason}")]
    CreateCopy {
        /// Resource being copied.
        parent: String,
        /// Requested copy name.
        name: String,
        /// Adapter-provided reason.
        reason: String,
    },

    /// A statement failed.
    #[error("statement failed on '{target}': {reason}")]
    Statement {
        /// Target the statement ran against.
        target: String,
        /// Adapter-provided reason.
        reason: String,
    },

    /// A copy could not be released.
    #[error("failed to destroy copy {copy_id}: {reason}")]
    Destroy {
        /// Copy being released.
        copy_id: ResourceCopyId,
        /// Adapter-provided reason.
        reason: String,
    },

    /// Generic adapter failure.
    #[error("resource runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ResourceLifecycleError {
    /// Wraps a runtime error from the adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
