//! Events observed by a subscriber during task processing.

use super::helpers::{collect_until_terminal, finished, kinds, order_lookup, pipeline, three_workers};
use forkwise::config::OrchestrationConfig;
use forkwise::events::EventType;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn observer_sees_the_canonical_sequence() -> Result<(), eyre::Report> {
    let run = pipeline(three_workers(), OrchestrationConfig::default());
    let collector = collect_until_terminal(run.processor.events().register().await?);

    let task = run.processor.submit(order_lookup()).await?;
    run.processor.process_task(task.id()).await?;

    let events = finished(collector).await?;
    eyre::ensure!(
        kinds(&events)
            == vec![
                EventType::TaskCreated,
                EventType::AgentsAssigned,
                EventType::ForkCreated,
                EventType::ForkCreated,
                EventType::ForkCreated,
                EventType::AnalysisCompleted,
                EventType::ProposalSubmitted,
                EventType::ProposalSubmitted,
                EventType::ProposalSubmitted,
                EventType::BenchmarkCompleted,
                EventType::ConsensusReached,
                EventType::TaskCompleted,
            ],
        "unexpected sequence: {:?}",
        kinds(&events)
    );
    let task_id = json!(task.id().value());
    eyre::ensure!(
        events.iter().all(|event| event.get("task_id") == Some(&task_id)),
        "every event names the task"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fork_events_name_role_copy_and_execution() -> Result<(), eyre::Report> {
    let run = pipeline(three_workers(), OrchestrationConfig::default());
    let task = run.processor.submit(order_lookup()).await?;
    let collector = collect_until_terminal(run.processor.events().register().await?);

    run.processor.process_task(task.id()).await?;

    let events = finished(collector).await?;
    let forks: Vec<_> = events
        .iter()
        .filter(|event| event.event_type == EventType::ForkCreated)
        .collect();
    eyre::ensure!(forks.len() == 3, "expected three fork events");
    for (fork, role) in forks.iter().zip(["cerebro", "operativo", "bulk"]) {
        eyre::ensure!(fork.get("agent_type") == Some(&json!(role)), "role order");
        eyre::ensure!(
            fork.get("fork_id") == Some(&json!(format!("fork-{role}-task{}", task.id()))),
            "copy name"
        );
        eyre::ensure!(
            fork.get("execution_id").is_some_and(serde_json::Value::is_i64),
            "execution id"
        );
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completion_event_carries_winner_and_timestamp() -> Result<(), eyre::Report> {
    let run = pipeline(three_workers(), OrchestrationConfig::default());
    let task = run.processor.submit(order_lookup()).await?;
    let collector = collect_until_terminal(run.processor.events().register().await?);

    let processed = run.processor.process_task(task.id()).await?;

    let events = finished(collector).await?;
    let completed = events
        .last()
        .ok_or_else(|| eyre::eyre!("no events observed"))?;
    eyre::ensure!(completed.event_type == EventType::TaskCompleted, "terminal event");
    let winner = processed
        .decision
        .winning_proposal_id()
        .ok_or_else(|| eyre::eyre!("no winner"))?;
    eyre::ensure!(
        completed.get("winning_proposal_id") == Some(&json!(winner.value())),
        "winner in payload"
    );
    eyre::ensure!(
        completed.get("status") == Some(&json!("completed")),
        "status in payload"
    );
    let stamp = completed
        .get("completed_at")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| eyre::eyre!("missing completion time"))?;
    chrono::DateTime::parse_from_rfc3339(stamp)?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn proposal_events_use_durable_identities() -> Result<(), eyre::Report> {
    let run = pipeline(three_workers(), OrchestrationConfig::default());
    let task = run.processor.submit(order_lookup()).await?;
    let collector = collect_until_terminal(run.processor.events().register().await?);

    let processed = run.processor.process_task(task.id()).await?;

    let events = finished(collector).await?;
    let mut announced: Vec<i64> = events
        .iter()
        .filter(|event| event.event_type == EventType::ProposalSubmitted)
        .filter_map(|event| event.get("proposal_id").and_then(serde_json::Value::as_i64))
        .collect();
    announced.sort_unstable();
    let mut stored: Vec<i64> = processed
        .proposals
        .iter()
        .map(|proposal| proposal.id().value())
        .collect();
    stored.sort_unstable();
    eyre::ensure!(announced == stored, "announced {announced:?}, stored {stored:?}");
    eyre::ensure!(announced.iter().all(|id| *id > 0), "durable ids are positive");
    Ok(())
}
