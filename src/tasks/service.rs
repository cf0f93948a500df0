//! Task service — client-facing create/get/retry/delete operations.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::model::Task;
use super::store::TaskRepository;
use crate::error::TaskError;
use crate::handlers::HandlerRegistry;

/// Translates client requests into repository and task operations.
#[derive(Clone)]
pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
    registry: Arc<HandlerRegistry>,
}

impl TaskService {
    pub fn new(repo: Arc<dyn TaskRepository>, registry: Arc<HandlerRegistry>) -> Self {
        Self { repo, registry }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Create and persist a task bound to the handler called `name`.
    ///
    /// An unknown handler name is rejected before anything is stored.
    pub async fn create(&self, name: &str, payload: impl Into<String>) -> Result<Task, TaskError> {
        let handler = self.registry.resolve(name)?;
        let task = Task::new(payload, handler);
        self.repo.save(task.clone()).await?;

        info!(task_id = %task.id, handler = name, "Task created");
        Ok(task)
    }

    pub async fn get(&self, id: Uuid) -> Result<Task, TaskError> {
        self.repo
            .get(id)
            .await?
            .ok_or(TaskError::NotFound { id })
    }

    /// Return a failed task to the queue. Tasks in any other state are
    /// returned unchanged.
    pub async fn retry(&self, id: Uuid) -> Result<Task, TaskError> {
        let task = self
            .repo
            .update(id, Box::new(|task: &mut Task| task.retry()))
            .await?
            .ok_or(TaskError::NotFound { id })?;

        info!(task_id = %id, status = %task.status, "Task retry requested");
        Ok(task)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), TaskError> {
        if self.repo.delete(id).await? {
            info!(task_id = %id, "Task deleted");
            Ok(())
        } else {
            Err(TaskError::NotFound { id })
        }
    }
}
