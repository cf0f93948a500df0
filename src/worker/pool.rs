//! Worker pool — fixed number of polling loops that claim and execute tasks.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::handlers::HandlerContext;
use crate::tasks::TaskRepository;

/// Worker pool settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of independent polling loops.
    pub worker_count: usize,
    /// Wait before each claim attempt.
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: 10,
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// A single polling loop.
pub struct Worker {
    id: usize,
    repo: Arc<dyn TaskRepository>,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl Worker {
    pub fn new(
        id: usize,
        repo: Arc<dyn TaskRepository>,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            repo,
            poll_interval,
            cancel,
        }
    }

    /// Poll until cancelled. Errors are logged and never end the loop.
    pub async fn run(self) {
        debug!(worker = self.id, "Worker started");

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            self.poll_once().await;
        }

        debug!(worker = self.id, "Worker stopped");
    }

    /// Claim at most one task, execute it and write it back.
    /// Returns whether a task was claimed.
    ///
    /// A task deleted while in work stays deleted; its outcome is dropped.
    pub async fn poll_once(&self) -> bool {
        let mut task = match self.repo.take().await {
            Ok(Some(task)) => task,
            Ok(None) => return false,
            Err(e) => {
                error!(worker = self.id, error = %e, "Failed to take task");
                return false;
            }
        };

        debug!(
            worker = self.id,
            task_id = %task.id,
            handler = task.handler_name(),
            "Executing task"
        );

        let ctx = HandlerContext::new(task.id, self.cancel.clone());
        match task.complete(&ctx).await {
            Ok(()) => info!(
                worker = self.id,
                task_id = %task.id,
                handler = task.handler_name(),
                "Task completed"
            ),
            Err(e) => warn!(
                worker = self.id,
                task_id = %task.id,
                handler = task.handler_name(),
                error = %e,
                "Failed to complete task"
            ),
        }

        let id = task.id;
        let status = task.status;
        match self.repo.finish(task).await {
            Ok(true) => {}
            Ok(false) => warn!(
                worker = self.id,
                task_id = %id,
                status = %status,
                "Task removed while in work; result dropped"
            ),
            Err(e) => error!(
                worker = self.id,
                task_id = %id,
                status = %status,
                error = %e,
                "Failed to save task"
            ),
        }

        true
    }
}

/// Handle to the running worker loops.
pub struct WorkerPool {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `config.worker_count` loops sharing `repo`. Cancelling `cancel`
    /// (or calling [`WorkerPool::shutdown`]) stops them all.
    pub fn spawn(
        config: &WorkerConfig,
        repo: Arc<dyn TaskRepository>,
        cancel: CancellationToken,
    ) -> Self {
        let handles = (0..config.worker_count)
            .map(|id| {
                let worker = Worker::new(id, Arc::clone(&repo), config.poll_interval, cancel.clone());
                tokio::spawn(worker.run())
            })
            .collect();

        info!(
            workers = config.worker_count,
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            "Worker pool started"
        );

        Self { cancel, handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Signal every loop to stop and wait for them to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                error!(error = %e, "Worker task panicked");
            }
        }
        info!("Worker pool stopped");
    }
}
