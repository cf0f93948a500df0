//! Handler abstraction — named units of work executed against a task payload.

pub mod builtin;
pub mod registry;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub use crate::error::HandlerError;
pub use registry::HandlerRegistry;

/// Execution context handed to a handler for a single task run.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    /// Task being executed.
    pub task_id: Uuid,
    cancel: CancellationToken,
}

impl HandlerContext {
    pub fn new(task_id: Uuid, cancel: CancellationToken) -> Self {
        Self { task_id, cancel }
    }

    /// Resolves once the service starts shutting down.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

/// A named, executable unit of work.
///
/// Implementations are shared across every worker loop, so they must either
/// be stateless or synchronize internally.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Registry key of this handler.
    fn name(&self) -> &str;

    /// Run the handler against a task payload.
    async fn execute(&self, payload: &str, ctx: &HandlerContext) -> Result<String, HandlerError>;
}
