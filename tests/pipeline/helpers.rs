//! Shared helpers for pipeline integration tests.

use forkwise::config::OrchestrationConfig;
use forkwise::events::{Event, EventHub, EventType, Subscription};
use forkwise::orchestration::adapters::memory::InMemoryResourceHost;
use forkwise::orchestration::adapters::scripted::{ScriptedWorkerFactory, WorkerScript};
use forkwise::orchestration::services::{ProcessorRepositories, SubmitTaskRequest, TaskProcessor};
use forkwise::task::domain::{AgentType, TaskType};
use mockable::DefaultClock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Pause before each scripted worker step, keeping event bursts short.
pub const STEP_DELAY: Duration = Duration::from_millis(10);

/// Processor type wired to in-memory adapters.
pub type TestProcessor = TaskProcessor<DefaultClock, InMemoryResourceHost>;

/// A processor plus handles to inspect what it stored and touched.
pub struct Pipeline {
    pub processor: TestProcessor,
    pub repositories: ProcessorRepositories,
    pub host: Arc<InMemoryResourceHost>,
}

/// Builds a processor over fresh in-memory adapters.
pub fn pipeline(factory: ScriptedWorkerFactory<DefaultClock>, config: OrchestrationConfig) -> Pipeline {
    let repositories = ProcessorRepositories::in_memory();
    let host = Arc::new(InMemoryResourceHost::new());
    let processor = TaskProcessor::new(
        repositories.clone(),
        Arc::new(factory),
        Arc::clone(&host),
        EventHub::spawn(),
        config,
        Arc::new(DefaultClock),
    );
    Pipeline {
        processor,
        repositories,
        host,
    }
}

/// Scripts an index proposal measured at `optimized_ms` against a 100 ms
/// baseline.
pub fn script(index: &str, optimized_ms: f64) -> WorkerScript {
    WorkerScript::index(format!("CREATE INDEX {index} ON orders (status)"))
        .with_timings(100.0, optimized_ms)
        .with_delay(STEP_DELAY)
}

/// Scripts all three roles; the planner is fastest.
pub fn three_workers() -> ScriptedWorkerFactory<DefaultClock> {
    ScriptedWorkerFactory::new(Arc::new(DefaultClock))
        .with_script(AgentType::Cerebro, script("idx_cerebro", 10.0))
        .with_script(AgentType::Operativo, script("idx_operativo", 50.0))
        .with_script(AgentType::Bulk, script("idx_bulk", 70.0))
}

/// A typical slow-query task.
pub fn order_lookup() -> SubmitTaskRequest {
    SubmitTaskRequest::new(
        TaskType::QueryOptimization,
        "Speed up open order lookups",
        "SELECT * FROM orders WHERE status = 'open'",
    )
}

/// Collects events until a terminal one arrives.
pub fn collect_until_terminal(mut subscription: Subscription) -> JoinHandle<Vec<Event>> {
    tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(raw) = subscription.recv().await {
            let Ok(event) = serde_json::from_str::<Event>(&raw) else {
                break;
            };
            let terminal = matches!(
                event.event_type,
                EventType::TaskCompleted | EventType::TaskFailed
            );
            seen.push(event);
            if terminal {
                break;
            }
        }
        seen
    })
}

/// Waits for a collector to see a terminal event.
///
/// # Errors
///
/// Returns an error when no terminal event arrives within five seconds or
/// the collector panicked.
pub async fn finished(collector: JoinHandle<Vec<Event>>) -> Result<Vec<Event>, eyre::Report> {
    let joined = tokio::time::timeout(Duration::from_secs(5), collector)
        .await
        .map_err(|_| eyre::eyre!("no terminal event within five seconds"))?;
    joined.map_err(|err| eyre::eyre!("collector failed: {err}"))
}

/// Returns the event kinds in arrival order.
pub fn kinds(events: &[Event]) -> Vec<EventType> {
    events.iter().map(|event| event.event_type).collect()
}
