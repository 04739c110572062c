use std::sync::Arc;

use tokio::sync::mpsc;

use docroute::application::services::{
    PipelineError, Submission, WorkerError, WorkerHandle, spawn_worker_pool,
};
use docroute::domain::Tier;

use crate::helpers::{
    ScriptedConverter, ScriptedFailure, as_converters, flowing_document, orchestrator,
};

#[tokio::test]
async fn given_running_pool_when_submitting_then_returns_pipeline_run() {
    let fast = ScriptedConverter::new(Tier::Fast, 0.9);
    let (workers, task) = spawn_worker_pool(Arc::new(orchestrator(as_converters(&[&fast]))), 2, 4);

    let submissions = (0..4).map(|_| workers.submit(Submission::new(flowing_document(2))));
    let runs = futures::future::join_all(submissions).await;

    assert!(runs.iter().all(Result::is_ok));
    assert_eq!(fast.calls(), 4);

    drop(workers);
    task.await.unwrap();
}

#[tokio::test]
async fn given_failing_pipeline_when_submitting_then_wraps_pipeline_error() {
    let fast = ScriptedConverter::failing(Tier::Fast, ScriptedFailure::Unrecoverable);
    let (workers, _task) =
        spawn_worker_pool(Arc::new(orchestrator(as_converters(&[&fast]))), 1, 1);

    let outcome = workers.submit(Submission::new(flowing_document(1))).await;

    assert!(matches!(
        outcome,
        Err(WorkerError::Pipeline(PipelineError::ConversionFailed {
            tier: Tier::Fast,
            ..
        }))
    ));
}

#[tokio::test]
async fn given_closed_queue_when_submitting_then_returns_queue_closed() {
    let (sender, receiver) = mpsc::channel(1);
    drop(receiver);

    let outcome = WorkerHandle::new(sender)
        .submit(Submission::new(flowing_document(1)))
        .await;

    assert!(matches!(outcome, Err(WorkerError::QueueClosed)));
}
