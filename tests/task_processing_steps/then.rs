//! Then steps for task processing BDD scenarios.

use super::world::{ProcessingWorld, run_async};
use forkwise::orchestration::services::ProcessedTask;
use forkwise::task::domain::{AgentType, ExecutionStatus, Task, TaskStatus};
use rstest_bdd_macros::then;

fn submitted(world: &ProcessingWorld) -> Result<&Task, eyre::Report> {
    world
        .task
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing submitted task"))
}

fn processed(world: &ProcessingWorld) -> Result<&ProcessedTask, eyre::Report> {
    match world.outcome.as_ref() {
        Some(Ok(processed)) => Ok(processed),
        Some(Err(err)) => Err(eyre::eyre!("task processing failed: {err}")),
        None => Err(eyre::eyre!("task was not processed")),
    }
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &ProcessingWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task_id = submitted(world)?.id();
    let stored = run_async(world.repositories.tasks.find_by_id(task_id))?
        .ok_or_else(|| eyre::eyre!("task {task_id} not stored"))?;
    eyre::ensure!(
        stored.status() == expected,
        "expected status {expected}, found {}",
        stored.status()
    );
    Ok(())
}

#[then(r#"the winning proposal came from "{role}""#)]
fn winner_came_from(world: &ProcessingWorld, role: String) -> Result<(), eyre::Report> {
    let expected = AgentType::try_from(role.as_str())
        .map_err(|err| eyre::eyre!("invalid role in scenario: {err}"))?;
    let outcome = processed(world)?;
    let winner_id = outcome
        .decision
        .winning_proposal_id()
        .ok_or_else(|| eyre::eyre!("no winning proposal"))?;
    let winner = outcome
        .proposals
        .iter()
        .find(|proposal| proposal.id() == winner_id)
        .ok_or_else(|| eyre::eyre!("winner {winner_id} not among proposals"))?;
    eyre::ensure!(
        winner.agent_type() == Some(expected),
        "winner came from {:?}",
        winner.agent_type()
    );
    Ok(())
}

#[then("every isolated copy has been released")]
fn copies_released(world: &ProcessingWorld) -> Result<(), eyre::Report> {
    let live = world.host.live_copies()?;
    eyre::ensure!(live.is_empty(), "copies still live: {live:?}");
    Ok(())
}

#[then(r#"every execution is "{status}""#)]
fn every_execution_is(world: &ProcessingWorld, status: String) -> Result<(), eyre::Report> {
    let expected = match status.as_str() {
        "running" => ExecutionStatus::Running,
        "completed" => ExecutionStatus::Completed,
        "failed" => ExecutionStatus::Failed,
        other => return Err(eyre::eyre!("invalid execution status in scenario: {other}")),
    };
    let task_id = submitted(world)?.id();
    let executions = run_async(world.repositories.executions.find_by_task(task_id))?;
    eyre::ensure!(!executions.is_empty(), "no executions recorded");
    eyre::ensure!(
        executions
            .iter()
            .all(|execution| execution.status() == expected),
        "expected every execution {expected}"
    );
    Ok(())
}

#[then("the decision is marked as applied")]
fn decision_applied(world: &ProcessingWorld) -> Result<(), eyre::Report> {
    let task_id = submitted(world)?.id();
    let decision = run_async(world.repositories.decisions.find_by_task(task_id))?
        .ok_or_else(|| eyre::eyre!("no decision stored"))?;
    eyre::ensure!(decision.applied_to_main(), "decision not applied");
    Ok(())
}

#[then(r#""{target}" received {count:usize} statement"#)]
fn target_received(
    world: &ProcessingWorld,
    target: String,
    count: usize,
) -> Result<(), eyre::Report> {
    let executed = world.host.executed()?;
    let received = executed
        .iter()
        .filter(|statement| statement.target == target)
        .count();
    eyre::ensure!(received == count, "{target} received {received} statements");
    Ok(())
}

#[then("{count:usize} proposal was submitted")]
fn proposals_submitted(world: &ProcessingWorld, count: usize) -> Result<(), eyre::Report> {
    let outcome = processed(world)?;
    eyre::ensure!(
        outcome.proposals.len() == count,
        "{} proposals were submitted",
        outcome.proposals.len()
    );
    Ok(())
}
