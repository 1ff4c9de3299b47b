//! When steps for task processing BDD scenarios.

use super::world::{ProcessingWorld, run_async};
use rstest_bdd_macros::when;

#[when("the task is processed")]
fn process_task(world: &mut ProcessingWorld) -> Result<(), eyre::Report> {
    let task_id = world
        .task
        .as_ref()
        .map(forkwise::task::domain::Task::id)
        .ok_or_else(|| eyre::eyre!("missing submitted task in scenario world"))?;
    let processor = world.build_processor()?;
    let outcome = run_async(processor.process_task(task_id));
    world.outcome = Some(outcome);
    Ok(())
}
