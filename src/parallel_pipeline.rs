// THEORY:
// The `parallel_pipeline` module runs many independent detection calls at once,
// one per image. A single call is strictly sequential; parallelism only ever
// happens between calls, each with its own rasters and its own box list.
//
// Layout:
// - a dispatcher task receives every `DetectionTask` and hands them out
//   round-robin to the workers;
// - each worker owns a clone of the shared, immutable `DetectionPipeline` and
//   runs the CPU-bound detection on tokio's blocking pool;
// - results travel back on a per-task `oneshot` channel, so callers await their
//   own image only.
//
// The region filter is shared across workers and therefore must be
// `Send + Sync`. A stateless filter (the usual case) trivially is.
//
// `BatchPipeline::new` spawns tasks and must be called from inside a tokio
// runtime.

use crate::error::PipelineError;
use crate::pipeline::{BoxList, DetectionPipeline, PipelineConfig, RegionFilter};
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};

pub type SharedFilter = Arc<dyn RegionFilter + Send + Sync>;

pub struct DetectionTask {
    pub image_id: u64,
    pub bytes: Vec<u8>,
    pub result_sender: oneshot::Sender<Result<BoxList, PipelineError>>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<DetectionTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(pipeline: Arc<DetectionPipeline>, filter: SharedFilter, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<DetectionTask>();
        let mut workers = Vec::with_capacity(worker_count + 1);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<DetectionTask>())
            .unzip();

        // Spawn dispatcher
        workers.push(tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if let Err(mpsc::error::SendError(task)) = worker_senders[worker_idx].send(task) {
                    let _ = task.result_sender.send(Err(PipelineError::WorkerUnavailable));
                }
                worker_idx = (worker_idx + 1) % worker_count;
            }
        }));

        // Spawn workers
        for (worker_id, mut worker_receiver) in worker_receivers.into_iter().enumerate() {
            let pipeline = Arc::clone(&pipeline);
            let filter = Arc::clone(&filter);

            workers.push(tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let result = Self::process_task(&pipeline, &filter, worker_id, task.image_id, task.bytes).await;
                    let _ = task.result_sender.send(result);
                }
            }));
        }

        Self { task_sender, workers }
    }

    async fn process_task(
        pipeline: &Arc<DetectionPipeline>,
        filter: &SharedFilter,
        worker_id: usize,
        image_id: u64,
        bytes: Vec<u8>,
    ) -> Result<BoxList, PipelineError> {
        let pipeline = Arc::clone(pipeline);
        let filter = Arc::clone(filter);
        let result = match tokio::task::spawn_blocking(move || pipeline.detect(&bytes, &*filter)).await {
            Ok(result) => result,
            Err(join_err) => {
                tracing::error!(worker_id, image_id, error = %join_err, "detection task did not complete");
                Err(match join_err.try_into_panic() {
                    Ok(payload) => PipelineError::DetectionPanicked {
                        image_id,
                        message: panic_message(payload.as_ref()),
                    },
                    Err(_) => PipelineError::WorkerUnavailable,
                })
            }
        };

        match &result {
            Ok(boxes) => tracing::debug!(worker_id, image_id, candidates = boxes.len(), "image processed"),
            Err(err) => tracing::warn!(worker_id, image_id, %err, "image failed"),
        }
        result
    }

    pub async fn submit(&self, image_id: u64, bytes: Vec<u8>) -> Result<BoxList, PipelineError> {
        let (result_sender, result_receiver) = oneshot::channel();

        let task = DetectionTask {
            image_id,
            bytes,
            result_sender,
        };

        self.task_sender
            .send(task)
            .map_err(|_| PipelineError::WorkerUnavailable)?;

        result_receiver.await.map_err(|_| PipelineError::WorkerUnavailable)?
    }

    /// Closes the task queue and waits for the dispatcher and every worker to exit.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        futures::future::join_all(self.workers).await;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Concurrent front end over a shared `DetectionPipeline`.
pub struct BatchPipeline {
    worker_pool: WorkerPool,
    image_counter: AtomicU64,
}

impl BatchPipeline {
    /// One worker per logical CPU.
    pub fn new(config: PipelineConfig, filter: SharedFilter) -> Result<Self, PipelineError> {
        Self::with_workers(config, filter, num_cpus::get())
    }

    pub fn with_workers(config: PipelineConfig, filter: SharedFilter, workers: usize) -> Result<Self, PipelineError> {
        if workers == 0 {
            return Err(PipelineError::InvalidConfig("batch pipeline needs at least one worker".into()));
        }
        let pipeline = Arc::new(DetectionPipeline::new(config)?);
        tracing::debug!(workers, "starting detection worker pool");
        Ok(Self {
            worker_pool: WorkerPool::new(pipeline, filter, workers),
            image_counter: AtomicU64::new(0),
        })
    }

    /// Detects candidates in one encoded image.
    pub async fn process_image(&self, bytes: Vec<u8>) -> Result<BoxList, PipelineError> {
        let image_id = self.image_counter.fetch_add(1, Ordering::Relaxed);
        self.worker_pool.submit(image_id, bytes).await
    }

    /// Detects candidates in every image concurrently. Results keep input order.
    pub async fn process_all(&self, images: Vec<Vec<u8>>) -> Vec<Result<BoxList, PipelineError>> {
        futures::future::join_all(images.into_iter().map(|bytes| self.process_image(bytes))).await
    }

    pub async fn shutdown(self) {
        self.worker_pool.shutdown().await;
    }
}
