//! Shared world state for task processing BDD scenarios.

use std::sync::Arc;

use forkwise::config::OrchestrationConfig;
use forkwise::events::EventHub;
use forkwise::orchestration::adapters::memory::InMemoryResourceHost;
use forkwise::orchestration::adapters::scripted::ScriptedWorkerFactory;
use forkwise::orchestration::services::{
    ProcessedTask, ProcessorRepositories, TaskProcessor, TaskProcessorResult,
};
use forkwise::task::domain::Task;
use mockable::DefaultClock;
use rstest::fixture;

/// Processor type used by the BDD world.
pub type TestProcessor = TaskProcessor<DefaultClock, InMemoryResourceHost>;

/// Scenario world for task processing behaviour tests.
pub struct ProcessingWorld {
    pub config: OrchestrationConfig,
    pub factory: Option<ScriptedWorkerFactory<DefaultClock>>,
    pub processor: Option<TestProcessor>,
    pub repositories: ProcessorRepositories,
    pub host: Arc<InMemoryResourceHost>,
    pub task: Option<Task>,
    pub outcome: Option<TaskProcessorResult<ProcessedTask>>,
}

impl ProcessingWorld {
    /// Creates a world with default configuration and no workers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: OrchestrationConfig::default(),
            factory: None,
            processor: None,
            repositories: ProcessorRepositories::in_memory(),
            host: Arc::new(InMemoryResourceHost::new()),
            task: None,
            outcome: None,
        }
    }

    /// Builds the processor from the scripted workers and configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when no workers were scripted.
    pub fn build_processor(&mut self) -> Result<&TestProcessor, eyre::Report> {
        if self.processor.is_none() {
            let factory = self
                .factory
                .take()
                .ok_or_else(|| eyre::eyre!("no workers scripted in scenario world"))?;
            self.processor = Some(TaskProcessor::new(
                self.repositories.clone(),
                Arc::new(factory),
                Arc::clone(&self.host),
                EventHub::spawn(),
                self.config.clone(),
                Arc::new(DefaultClock),
            ));
        }
        self.processor
            .as_ref()
            .ok_or_else(|| eyre::eyre!("processor missing"))
    }
}

impl Default for ProcessingWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ProcessingWorld {
    ProcessingWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
