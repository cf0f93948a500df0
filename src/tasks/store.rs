//! Task repository — the single arbiter of concurrent access to tasks.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::model::{Task, TaskStatus};
use crate::error::StorageError;

/// Mutation applied to a stored task under the repository lock.
pub type TaskUpdate = Box<dyn for<'a> FnOnce(&'a mut Task) + Send>;

/// Backend-agnostic task store.
///
/// Callers work on copies; changes only become visible to other workers once
/// written back through the repository.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert or replace a task by id. Last writer wins.
    async fn save(&self, task: Task) -> Result<(), StorageError>;

    /// Get a copy of a task by id.
    async fn get(&self, id: Uuid) -> Result<Option<Task>, StorageError>;

    /// Remove a task. Returns `false` if it was absent.
    async fn delete(&self, id: Uuid) -> Result<bool, StorageError>;

    /// Atomically claim one `Created` task, moving it to `InWork`.
    ///
    /// Concurrent callers never receive the same task. Returns `None` when no
    /// task is waiting. No selection order is promised.
    async fn take(&self) -> Result<Option<Task>, StorageError>;

    /// Apply `f` to a stored task atomically and return the updated copy.
    async fn update(&self, id: Uuid, f: TaskUpdate) -> Result<Option<Task>, StorageError>;

    /// Write back the outcome of an execution.
    ///
    /// Only replaces a task that is still stored and still `InWork`; returns
    /// `false` (dropping the outcome) if it was deleted meanwhile.
    async fn finish(&self, task: Task) -> Result<bool, StorageError>;

    /// Number of stored tasks.
    async fn len(&self) -> Result<usize, StorageError>;
}

/// In-memory repository. One lock guards the whole collection and every
/// mutating operation takes it for writing.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn save(&self, task: Task) -> Result<(), StorageError> {
        self.tasks.write().await.insert(task.id, task);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>, StorageError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StorageError> {
        Ok(self.tasks.write().await.remove(&id).is_some())
    }

    async fn take(&self) -> Result<Option<Task>, StorageError> {
        let mut tasks = self.tasks.write().await;

        let Some(task) = tasks
            .values_mut()
            .find(|t| t.status == TaskStatus::Created)
        else {
            return Ok(None);
        };

        task.mark_taken();
        debug!(task_id = %task.id, handler = task.handler_name(), "Task taken");
        Ok(Some(task.clone()))
    }

    async fn update(&self, id: Uuid, f: TaskUpdate) -> Result<Option<Task>, StorageError> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.get_mut(&id).map(|task| {
            f(task);
            task.clone()
        }))
    }

    async fn finish(&self, task: Task) -> Result<bool, StorageError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(stored) if stored.status == TaskStatus::InWork => {
                *stored = task;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn len(&self) -> Result<usize, StorageError> {
        Ok(self.tasks.read().await.len())
    }
}
