//! Task state machine and its external view.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::TaskError;
use crate::handlers::{Handler, HandlerContext};

/// Status of a task. The discriminants are the wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskStatus {
    /// Never produced by [`Task::new`].
    Unknown = 0,
    /// Waiting for a worker.
    Created = 1,
    /// Claimed by a worker and executing.
    InWork = 2,
    /// Handler succeeded. Terminal.
    Completed = 3,
    /// Handler failed; may be retried.
    Failed = 4,
}

impl TaskStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Created => "created",
            Self::InWork => "in_work",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A unit of submitted work bound to the handler that will execute it.
#[derive(Clone)]
pub struct Task {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub taken_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub payload: String,
    pub status: TaskStatus,
    pub result: String,
    /// Monotonic claim time backing the live `InWork` duration.
    claimed: Option<Instant>,
    handler: Arc<dyn Handler>,
}

impl Task {
    /// Create a task in the `Created` state.
    pub fn new(payload: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            taken_at: None,
            completed_at: None,
            payload: payload.into(),
            status: TaskStatus::Created,
            result: String::new(),
            claimed: None,
            handler,
        }
    }

    /// Name of the bound handler.
    pub fn handler_name(&self) -> &str {
        self.handler.name()
    }

    /// `Created → InWork`. Ignored in any other state.
    pub fn mark_taken(&mut self) {
        if self.status == TaskStatus::Created {
            self.status = TaskStatus::InWork;
            self.taken_at = Some(Utc::now());
            self.claimed = Some(Instant::now());
        }
    }

    /// `Failed → Created`, clearing the claim. Ignored in any other state.
    pub fn retry(&mut self) {
        if self.status == TaskStatus::Failed {
            self.status = TaskStatus::Created;
            self.taken_at = None;
            self.claimed = None;
        }
    }

    /// Run the bound handler and record the outcome.
    ///
    /// On handler failure the task becomes `Failed` and the error is returned;
    /// persisting the new state is up to the caller.
    pub async fn complete(&mut self, ctx: &HandlerContext) -> Result<(), TaskError> {
        if self.status != TaskStatus::InWork {
            return Err(TaskError::InvalidState {
                id: self.id,
                status: self.status,
                expected: TaskStatus::InWork,
            });
        }

        let outcome = self.handler.execute(&self.payload, ctx).await;
        match outcome {
            Ok(result) => {
                self.result = result;
                self.status = TaskStatus::Completed;
                self.completed_at = Some(Utc::now());
                Ok(())
            }
            Err(source) => {
                self.status = TaskStatus::Failed;
                Err(TaskError::Execution {
                    id: self.id,
                    source,
                })
            }
        }
    }

    /// Time spent in work: live for `InWork`, fixed for `Completed`, zero otherwise.
    ///
    /// The live value uses the monotonic clock, so wall clock steps never
    /// make it shrink.
    pub fn processing_duration(&self) -> Duration {
        match self.status {
            TaskStatus::InWork => self.claimed.map(|at| at.elapsed()).unwrap_or_default(),
            TaskStatus::Completed => match (self.taken_at, self.completed_at) {
                (Some(taken), Some(done)) => done
                    .signed_duration_since(taken)
                    .to_std()
                    .unwrap_or_default(),
                _ => Duration::ZERO,
            },
            _ => Duration::ZERO,
        }
    }

    pub fn view(&self) -> TaskView {
        TaskView::from(self)
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.created_at == other.created_at
            && self.taken_at == other.taken_at
            && self.completed_at == other.completed_at
            && self.payload == other.payload
            && self.status == other.status
            && self.result == other.result
            && self.claimed == other.claimed
            && Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("handler", &self.handler_name())
            .field("created_at", &self.created_at)
            .field("taken_at", &self.taken_at)
            .field("completed_at", &self.completed_at)
            .field("payload", &self.payload)
            .field("result", &self.result)
            .finish()
    }
}

/// External representation of a task. The bound handler is not exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub taken_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub payload: String,
    pub processing_duration: String,
    pub status: u8,
    pub result: String,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            created_at: task.created_at,
            taken_at: task.taken_at,
            completed_at: task.completed_at,
            payload: task.payload.clone(),
            processing_duration: format_duration(task.processing_duration()),
            status: task.status.code(),
            result: task.result.clone(),
        }
    }
}

/// Compact duration rendering: `0s`, `250ms`, `1.5s`.
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        "0s".to_string()
    } else {
        format!("{d:?}")
    }
}
