//! In-memory resource host for orchestration tests and local runs.

use crate::orchestration::ports::{
    QueryResult, ResourceLifecycle, ResourceLifecycleError, ResourceLifecycleResult,
};
use crate::task::domain::ResourceCopyId;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

/// In-memory stand-in for a database host that can fork copies.
///
/// Copies are tracked by name and every executed statement is recorded.
/// Failures can be injected per copy name, per statement fragment, or per
/// copy release.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResourceHost {
    state: Arc<RwLock<InMemoryHostState>>,
}

#[derive(Debug, Default)]
struct InMemoryHostState {
    copies: BTreeMap<ResourceCopyId, String>,
    executed: Vec<ExecutedStatement>,
    failing_copy_names: HashSet<String>,
    failing_statement_fragments: Vec<String>,
    failing_releases: HashSet<ResourceCopyId>,
}

/// A statement recorded by [`InMemoryResourceHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedStatement {
    /// Target the statement ran against.
    pub target: String,
    /// Statement text.
    pub statement: String,
}

fn lock_error(err: impl ToString) -> ResourceLifecycleError {
    ResourceLifecycleError::runtime(std::io::Error::other(err.to_string()))
}

impl InMemoryResourceHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes creation of the copy called `name` fail.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn fail_copy_creation(&self, name: impl Into<String>) -> ResourceLifecycleResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.failing_copy_names.insert(name.into());
        Ok(())
    }

    /// Makes any statement containing `fragment` fail.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn fail_statements_containing(
        &self,
        fragment: impl Into<String>,
    ) -> ResourceLifecycleResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.failing_statement_fragments.push(fragment.into());
        Ok(())
    }

    /// Makes releasing `copy_id` fail.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn fail_release(&self, copy_id: ResourceCopyId) -> ResourceLifecycleResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.failing_releases.insert(copy_id);
        Ok(())
    }

    /// Returns the copies that currently exist.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn live_copies(&self) -> ResourceLifecycleResult<Vec<ResourceCopyId>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.copies.keys().cloned().collect())
    }

    /// Returns statements executed so far, in execution order.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn executed(&self) -> ResourceLifecycleResult<Vec<ExecutedStatement>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.executed.clone())
    }
}

#[async_trait]
impl ResourceLifecycle for InMemoryResourceHost {
    async fn create_copy(&self, parent: &str, name: &str) -> ResourceLifecycleResult<ResourceCopyId> {
        let mut state = self.state.write().map_err(lock_error)?;
        let failure = |reason: &str| ResourceLifecycleError::CreateCopy {
            parent: parent.to_owned(),
            name: name.to_owned(),
            reason: reason.to_owned(),
        };
        if parent.trim().is_empty() || name.trim().is_empty() {
            return Err(failure("parent and name are required"));
        }
        if state.failing_copy_names.contains(name) {
            return Err(failure("injected failure"));
        }
        let copy_id = ResourceCopyId::new(name);
        if state.copies.contains_key(&copy_id) {
            return Err(failure("copy already exists"));
        }
        state.copies.insert(copy_id.clone(), parent.to_owned());
        Ok(copy_id)
    }

    async fn execute_statement(
        &self,
        target: &str,
        statement: &str,
        _timeout_ms: u64,
    ) -> ResourceLifecycleResult<QueryResult> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state
            .failing_statement_fragments
            .iter()
            .any(|fragment| statement.contains(fragment.as_str()))
        {
            return Err(ResourceLifecycleError::Statement {
                target: target.to_owned(),
                reason: "injected failure".to_owned(),
            });
        }
        state.executed.push(ExecutedStatement {
            target: target.to_owned(),
            statement: statement.to_owned(),
        });
        Ok(QueryResult { rows_affected: 0 })
    }

    async fn destroy_copy(&self, copy_id: &ResourceCopyId) -> ResourceLifecycleResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.failing_releases.contains(copy_id) {
            return Err(ResourceLifecycleError::Destroy {
                copy_id: copy_id.clone(),
                reason: "injected failure".to_owned(),
            });
        }
        state.copies.remove(copy_id);
        Ok(())
    }
}
