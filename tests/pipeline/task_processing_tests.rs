//! Full task runs through the processor.

use super::helpers::{Pipeline, order_lookup, pipeline, script, three_workers};
use forkwise::config::OrchestrationConfig;
use forkwise::orchestration::adapters::scripted::ScriptedWorkerFactory;
use forkwise::orchestration::ports::WorkerStep;
use forkwise::orchestration::services::TaskProcessorError;
use forkwise::task::domain::{AgentType, ExecutionStatus, ResourceCopyId, TaskStatus};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use std::sync::Arc;

#[fixture]
fn default_pipeline() -> Pipeline {
    pipeline(three_workers(), OrchestrationConfig::default())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_records_are_linked_by_durable_identities(default_pipeline: Pipeline) {
    let task = default_pipeline
        .processor
        .submit(order_lookup())
        .await
        .expect("submitted");

    let processed = default_pipeline
        .processor
        .process_task(task.id())
        .await
        .expect("processed");

    for execution in &processed.executions {
        let proposals = default_pipeline
            .repositories
            .proposals
            .find_by_execution(execution.id())
            .await
            .expect("proposals by execution");
        assert_eq!(proposals.len(), 1);
        let proposal = proposals.first().expect("one proposal");
        assert!(!proposal.id().is_provisional());
        assert_eq!(proposal.agent_type(), Some(execution.agent_type()));
        assert!(proposal.score_breakdown().is_some());

        let benchmarks = default_pipeline
            .repositories
            .benchmarks
            .find_by_proposal(proposal.id())
            .await
            .expect("benchmarks by proposal");
        assert_eq!(benchmarks.len(), 2);
        assert!(benchmarks.iter().any(|run| run.query_name().is_baseline()));
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scores_rank_every_role(default_pipeline: Pipeline) {
    let task = default_pipeline
        .processor
        .submit(order_lookup())
        .await
        .expect("submitted");

    let processed = default_pipeline
        .processor
        .process_task(task.id())
        .await
        .expect("processed");

    let scores = processed.decision.all_scores();
    let rank = |role: AgentType| scores.get(&role).map(|score| score.rank);
    assert_eq!(rank(AgentType::Cerebro), Some(1));
    assert_eq!(rank(AgentType::Operativo), Some(2));
    assert_eq!(rank(AgentType::Bulk), Some(3));
    let best = scores.get(&AgentType::Cerebro).expect("planner score");
    assert_eq!(best.weighted_total, 93.0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn all_workers_failing_leaves_nothing_running() {
    let factory = ScriptedWorkerFactory::new(Arc::new(DefaultClock))
        .with_script(
            AgentType::Cerebro,
            script("idx_c", 10.0).failing_at(WorkerStep::Analyze),
        )
        .with_script(
            AgentType::Operativo,
            script("idx_o", 10.0).failing_at(WorkerStep::Analyze),
        )
        .with_script(
            AgentType::Bulk,
            script("idx_b", 10.0).failing_at(WorkerStep::Propose),
        );
    let failing = pipeline(factory, OrchestrationConfig::default());
    let task = failing
        .processor
        .submit(order_lookup())
        .await
        .expect("submitted");

    let result = failing.processor.process_task(task.id()).await;

    assert!(matches!(result, Err(TaskProcessorError::Orchestrator(_))));
    let stored = failing
        .repositories
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task stored");
    assert_eq!(stored.status(), TaskStatus::Failed);
    let executions = failing
        .repositories
        .executions
        .find_by_task(task.id())
        .await
        .expect("executions");
    assert!(
        executions
            .iter()
            .all(|execution| execution.status() == ExecutionStatus::Failed)
    );
    assert!(
        failing
            .repositories
            .decisions
            .find_by_task(task.id())
            .await
            .expect("lookup")
            .is_none()
    );
    assert!(failing.host.live_copies().expect("copies").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn release_failures_do_not_fail_a_successful_run(default_pipeline: Pipeline) {
    let task = default_pipeline
        .processor
        .submit(order_lookup())
        .await
        .expect("submitted");
    default_pipeline
        .host
        .fail_release(ResourceCopyId::new(format!(
            "fork-bulk-task{}",
            task.id()
        )))
        .expect("inject");

    let processed = default_pipeline
        .processor
        .process_task(task.id())
        .await
        .expect("processed");

    assert_eq!(processed.task.status(), TaskStatus::Completed);
    assert!(!processed.cleanup.is_clean());
    assert_eq!(processed.cleanup.released.len(), 2);
    assert_eq!(processed.cleanup.failures.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_fails_when_no_copy_can_be_made(default_pipeline: Pipeline) {
    let task = default_pipeline
        .processor
        .submit(order_lookup())
        .await
        .expect("submitted");
    for role in AgentType::CANONICAL {
        default_pipeline
            .host
            .fail_copy_creation(format!("fork-{role}-task{}", task.id()))
            .expect("inject");
    }

    let result = default_pipeline.processor.process_task(task.id()).await;

    assert!(matches!(
        result,
        Err(TaskProcessorError::NoWorkersDispatched(id)) if id == task.id()
    ));
    let stored = default_pipeline
        .repositories
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task stored");
    assert_eq!(stored.status(), TaskStatus::Failed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn independent_tasks_can_run_concurrently(default_pipeline: Pipeline) {
    let first = default_pipeline
        .processor
        .submit(order_lookup())
        .await
        .expect("first submitted");
    let second = default_pipeline
        .processor
        .submit(order_lookup())
        .await
        .expect("second submitted");

    let (first_run, second_run) = tokio::join!(
        default_pipeline.processor.process_task(first.id()),
        default_pipeline.processor.process_task(second.id())
    );

    let first_done = first_run.expect("first processed");
    let second_done = second_run.expect("second processed");
    assert_eq!(first_done.task.status(), TaskStatus::Completed);
    assert_eq!(second_done.task.status(), TaskStatus::Completed);
    assert_ne!(
        first_done.decision.winning_proposal_id(),
        second_done.decision.winning_proposal_id()
    );
    assert!(default_pipeline.host.live_copies().expect("copies").is_empty());
}
