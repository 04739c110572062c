use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::Instrument;

use super::orchestrator::{Orchestrator, PipelineError, PipelineRun, Submission};

pub struct ConversionJob {
    pub submission: Submission,
    pub reply: oneshot::Sender<Result<PipelineRun, PipelineError>>,
}

/// Drains the job queue, running up to `pool_size` pipelines at once.
pub struct ConversionWorker {
    receiver: mpsc::Receiver<ConversionJob>,
    orchestrator: Arc<Orchestrator>,
    permits: Arc<Semaphore>,
}

impl ConversionWorker {
    pub fn new(
        receiver: mpsc::Receiver<ConversionJob>,
        orchestrator: Arc<Orchestrator>,
        pool_size: usize,
    ) -> Self {
        Self {
            receiver,
            orchestrator,
            permits: Arc::new(Semaphore::new(pool_size.max(1))),
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            pool_size = self.permits.available_permits(),
            "Conversion worker started"
        );
        let mut in_flight = JoinSet::new();

        while let Some(job) = self.receiver.recv().await {
            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                break;
            };
            let orchestrator = Arc::clone(&self.orchestrator);
            let span = tracing::info_span!(
                "conversion_job",
                document_id = %job.submission.document.id(),
                filename = %job.submission.document.filename(),
            );

            in_flight.spawn(
                async move {
                    let outcome = orchestrator.process(job.submission).await;
                    match &outcome {
                        Ok(run) => tracing::debug!(
                            tier = %run.result.tier_used,
                            cached = run.result.cached,
                            "Conversion job finished"
                        ),
                        Err(e) => tracing::error!(error = %e, "Conversion job failed"),
                    }
                    if job.reply.send(outcome).is_err() {
                        tracing::warn!("Submitter dropped before the result was ready");
                    }
                    drop(permit);
                }
                .instrument(span),
            );

            while in_flight.try_join_next().is_some() {}
        }

        while in_flight.join_next().await.is_some() {}
        tracing::info!("Conversion worker stopped: channel closed");
    }
}

/// Client side of the worker queue.
#[derive(Clone)]
pub struct WorkerHandle {
    sender: mpsc::Sender<ConversionJob>,
}

impl WorkerHandle {
    pub fn new(sender: mpsc::Sender<ConversionJob>) -> Self {
        Self { sender }
    }

    pub async fn submit(&self, submission: Submission) -> Result<PipelineRun, WorkerError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(ConversionJob { submission, reply })
            .await
            .map_err(|_| WorkerError::QueueClosed)?;

        response
            .await
            .map_err(|_| WorkerError::Dropped)?
            .map_err(WorkerError::Pipeline)
    }
}

/// Starts a worker on the current runtime and returns its handle.
pub fn spawn_worker_pool(
    orchestrator: Arc<Orchestrator>,
    pool_size: usize,
    queue_depth: usize,
) -> (WorkerHandle, tokio::task::JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(queue_depth.max(1));
    let worker = ConversionWorker::new(receiver, orchestrator, pool_size);
    (WorkerHandle::new(sender), tokio::spawn(worker.run()))
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("conversion queue is closed")]
    QueueClosed,
    #[error("worker dropped the job before replying")]
    Dropped,
    #[error("pipeline: {0}")]
    Pipeline(PipelineError),
}
