//! Behaviour driven by TOML configuration.

use super::helpers::{order_lookup, pipeline, script};
use forkwise::config::OrchestrationConfig;
use forkwise::orchestration::adapters::scripted::ScriptedWorkerFactory;
use forkwise::orchestration::ports::WorkerError;
use forkwise::orchestration::services::{SubmitTaskRequest, TaskProcessorError};
use forkwise::proposal::domain::{EstimatedImpact, ImpactLevel};
use forkwise::task::domain::{AgentType, ExecutionStatus, TaskType};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const ROUTED: &str = r#"worker_selection = "routed""#;

/// The planner is faster but needs a wide index; the operator is lean.
#[fixture]
fn planner_and_operator() -> ScriptedWorkerFactory<DefaultClock> {
    ScriptedWorkerFactory::new(Arc::new(DefaultClock))
        .with_script(
            AgentType::Cerebro,
            script("idx_wide", 10.0).with_impact(EstimatedImpact::new(
                90.0,
                90.0,
                ImpactLevel::Low,
                ImpactLevel::Low,
            )),
        )
        .with_script(
            AgentType::Operativo,
            script("idx_lean", 50.0).with_impact(EstimatedImpact::new(
                50.0,
                0.0,
                ImpactLevel::Low,
                ImpactLevel::Low,
            )),
        )
}

fn join_query() -> SubmitTaskRequest {
    SubmitTaskRequest::new(
        TaskType::QueryOptimization,
        "Speed up the customer order report",
        "SELECT * FROM orders o JOIN customers c ON c.id = o.customer_id",
    )
}

async fn winning_role(
    factory: ScriptedWorkerFactory<DefaultClock>,
    config: OrchestrationConfig,
) -> Result<Option<AgentType>, eyre::Report> {
    let run = pipeline(factory, config);
    let task = run.processor.submit(join_query()).await?;
    let processed = run.processor.process_task(task.id()).await?;
    let winner = processed.decision.winning_proposal_id();
    Ok(processed
        .proposals
        .iter()
        .find(|proposal| Some(proposal.id()) == winner)
        .and_then(|proposal| proposal.agent_type()))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn default_weights_favour_speed(
    planner_and_operator: ScriptedWorkerFactory<DefaultClock>,
) -> Result<(), eyre::Report> {
    let config = OrchestrationConfig::from_toml_str(ROUTED)?;
    let winner = winning_role(planner_and_operator, config).await?;
    eyre::ensure!(winner == Some(AgentType::Cerebro), "winner was {winner:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn storage_heavy_weights_favour_the_lean_proposal(
    planner_and_operator: ScriptedWorkerFactory<DefaultClock>,
) -> Result<(), eyre::Report> {
    let config = OrchestrationConfig::from_toml_str(&format!(
        "{ROUTED}\n\n[scoring]\nperformance_weight = 0.1\nstorage_weight = 0.7\ncomplexity_weight = 0.1\nrisk_weight = 0.1\n"
    ))?;
    let winner = winning_role(planner_and_operator, config).await?;
    eyre::ensure!(winner == Some(AgentType::Operativo), "winner was {winner:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn routing_engages_roles_without_a_worker(
    planner_and_operator: ScriptedWorkerFactory<DefaultClock>,
) -> Result<(), eyre::Report> {
    let run = pipeline(planner_and_operator, OrchestrationConfig::from_toml_str(ROUTED)?);
    let task = run
        .processor
        .submit(order_lookup().with_metadata("priority", json!("high")))
        .await?;

    let result = run.processor.process_task(task.id()).await;

    eyre::ensure!(
        matches!(
            result,
            Err(TaskProcessorError::Worker(WorkerError::Unavailable {
                agent_type: AgentType::Bulk,
                ..
            }))
        ),
        "unexpected result: {result:?}"
    );
    eyre::ensure!(run.host.live_copies()?.is_empty(), "copies released");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn configured_deadline_times_out_slow_workers() -> Result<(), eyre::Report> {
    let config = OrchestrationConfig::from_toml_str("worker_timeout_secs = 1")?;
    let factory = ScriptedWorkerFactory::new(Arc::new(DefaultClock))
        .with_script(
            AgentType::Cerebro,
            script("idx_slow", 10.0).with_delay(Duration::from_secs(3)),
        )
        .with_script(AgentType::Operativo, script("idx_o", 50.0))
        .with_script(AgentType::Bulk, script("idx_b", 70.0));
    let run = pipeline(factory, config);
    let task = run.processor.submit(order_lookup()).await?;

    let processed = run.processor.process_task(task.id()).await?;

    let planner = processed
        .executions
        .iter()
        .find(|execution| execution.agent_type() == AgentType::Cerebro)
        .ok_or_else(|| eyre::eyre!("planner execution missing"))?;
    eyre::ensure!(planner.status() == ExecutionStatus::Failed, "planner failed");
    eyre::ensure!(
        planner.error().is_some_and(|error| error.contains("timed out")),
        "timeout recorded: {:?}",
        planner.error()
    );
    eyre::ensure!(processed.proposals.len() == 2, "two proposals survive");
    Ok(())
}

#[rstest]
fn invalid_weights_are_rejected_at_load() {
    let result = OrchestrationConfig::from_toml_str(
        "[scoring]\nperformance_weight = 0.9\nstorage_weight = 0.9\n",
    );
    assert!(result.is_err());
}
