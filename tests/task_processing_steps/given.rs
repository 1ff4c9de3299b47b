//! Given steps for task processing BDD scenarios.

use super::world::{ProcessingWorld, run_async};
use eyre::WrapErr;
use forkwise::config::WorkerSelection;
use forkwise::orchestration::adapters::scripted::{ScriptedWorkerFactory, WorkerScript};
use forkwise::orchestration::ports::WorkerStep;
use forkwise::orchestration::services::SubmitTaskRequest;
use forkwise::task::domain::{AgentType, TaskType};
use mockable::DefaultClock;
use rstest_bdd_macros::given;
use std::sync::Arc;
use std::time::Duration;

fn script(role: AgentType, optimized_ms: f64) -> WorkerScript {
    WorkerScript::index(format!("CREATE INDEX idx_{role} ON orders (status)"))
        .with_timings(100.0, optimized_ms)
        .with_delay(Duration::from_millis(10))
}

fn scripted_roles(fail_at: Option<WorkerStep>) -> ScriptedWorkerFactory<DefaultClock> {
    [
        (AgentType::Cerebro, 10.0),
        (AgentType::Operativo, 50.0),
        (AgentType::Bulk, 70.0),
    ]
    .into_iter()
    .fold(
        ScriptedWorkerFactory::new(Arc::new(DefaultClock)),
        |factory, (role, optimized_ms)| {
            let role_script = script(role, optimized_ms);
            factory.with_script(
                role,
                match fail_at {
                    Some(step) => role_script.failing_at(step),
                    None => role_script,
                },
            )
        },
    )
}

#[given("scripted workers for every role")]
fn scripted_workers(world: &mut ProcessingWorld) {
    world.factory = Some(scripted_roles(None));
}

#[given(r#"scripted workers for every role failing at "{step}""#)]
fn failing_workers(world: &mut ProcessingWorld, step: String) -> Result<(), eyre::Report> {
    let failing_step = match step.as_str() {
        "analyze" => WorkerStep::Analyze,
        "propose" => WorkerStep::Propose,
        "benchmark" => WorkerStep::Benchmark,
        other => return Err(eyre::eyre!("unknown worker step in scenario: {other}")),
    };
    world.factory = Some(scripted_roles(Some(failing_step)));
    Ok(())
}

#[given(r#"winners are applied to "{target}""#)]
fn winners_are_applied(world: &mut ProcessingWorld, target: String) {
    world.config.apply_winner = true;
    world.config.main_target = target;
}

#[given("workers are routed by the selector")]
fn workers_are_routed(world: &mut ProcessingWorld) {
    world.config.worker_selection = WorkerSelection::Routed;
}

#[given(r#"a submitted task targeting "{query}""#)]
fn submitted_task(world: &mut ProcessingWorld, query: String) -> Result<(), eyre::Report> {
    let processor = world.build_processor()?;
    let task = run_async(processor.submit(SubmitTaskRequest::new(
        TaskType::QueryOptimization,
        "scenario task",
        query,
    )))
    .wrap_err("submit task for processing scenario")?;
    world.task = Some(task);
    Ok(())
}
